//! Nearest-neighbour property recommendation.
//!
//! Each property becomes a feature vector: price, area, bedrooms and
//! bathrooms min-max scaled over the candidate set (query included), a
//! one-hot kind, and a city-match bit. Candidates are ranked by Euclidean
//! distance to the query; features the query leaves out are ignored.

use crate::models::properties::{PropertyData, PropertyKind};

pub const DEFAULT_LIMIT: usize = 6;
pub const MAX_LIMIT: usize = 50;

#[derive(Debug, Clone, Default)]
pub struct Preferences {
    pub price: i64,
    pub area_sqft: Option<i32>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub kind: Option<PropertyKind>,
    pub city: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Scored<'a> {
    pub property: &'a PropertyData,
    pub distance: f64,
}

#[derive(Debug, Clone, Copy)]
struct Scale {
    min: f64,
    max: f64,
}

impl Scale {
    fn over(query: f64, values: impl Iterator<Item = f64>) -> Self {
        values.fold(Self { min: query, max: query }, |scale, v| Self {
            min: scale.min.min(v),
            max: scale.max.max(v),
        })
    }

    fn apply(&self, v: f64) -> f64 {
        let span = self.max - self.min;
        if span <= f64::EPSILON {
            0.0
        } else {
            (v - self.min) / span
        }
    }

    fn squared_gap(&self, a: f64, b: f64) -> f64 {
        let d = self.apply(a) - self.apply(b);
        d * d
    }
}

/// Squared distance between two one-hot kind vectors.
fn kind_gap(kind: PropertyKind, other: &str) -> f64 {
    if kind.as_str() == other {
        0.0
    } else {
        2.0
    }
}

/// Scale for one numeric feature, or `None` when the query leaves it out.
fn feature_scale<F>(query: Option<i32>, candidates: &[PropertyData], field: F) -> Option<(f64, Scale)>
where
    F: Fn(&PropertyData) -> i32,
{
    query.map(|q| {
        let q = q as f64;
        (q, Scale::over(q, candidates.iter().map(|p| field(p) as f64)))
    })
}

fn numeric_gap(feature: Option<(f64, Scale)>, value: i32) -> f64 {
    match feature {
        Some((query, scale)) => scale.squared_gap(query, value as f64),
        None => 0.0,
    }
}

pub fn rank<'a>(prefs: &Preferences, candidates: &'a [PropertyData], limit: usize) -> Vec<Scored<'a>> {
    let price_scale = Scale::over(prefs.price as f64, candidates.iter().map(|p| p.price as f64));
    let area = feature_scale(prefs.area_sqft, candidates, |p| p.area_sqft);
    let bedrooms = feature_scale(prefs.bedrooms, candidates, |p| p.bedrooms);
    let bathrooms = feature_scale(prefs.bathrooms, candidates, |p| p.bathrooms);
    let city = prefs
        .city
        .as_deref()
        .map(|city| city.trim().to_lowercase())
        .filter(|city| !city.is_empty());

    let mut scored: Vec<Scored> = candidates
        .iter()
        .map(|property| {
            let mut d2 = price_scale.squared_gap(prefs.price as f64, property.price as f64);
            d2 += numeric_gap(area, property.area_sqft);
            d2 += numeric_gap(bedrooms, property.bedrooms);
            d2 += numeric_gap(bathrooms, property.bathrooms);
            if let Some(kind) = prefs.kind {
                d2 += kind_gap(kind, &property.kind);
            }
            if let Some(city) = &city {
                if property.city.trim().to_lowercase() != *city {
                    d2 += 1.0;
                }
            }
            Scored {
                property,
                distance: d2.sqrt(),
            }
        })
        .collect();

    scored.sort_by(|a, b| {
        a.distance
            .total_cmp(&b.distance)
            .then(a.property.pid.cmp(&b.property.pid))
    });
    scored.truncate(limit.min(MAX_LIMIT));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(pid: u64, kind: &str, price: i64, area: i32, beds: i32, city: &str) -> PropertyData {
        PropertyData {
            pid,
            title: format!("Listing {}", pid),
            description: "".to_string(),
            kind: kind.to_string(),
            purpose: "sale".to_string(),
            price,
            area_sqft: area,
            bedrooms: beds,
            bathrooms: beds.max(1),
            city: city.to_string(),
            address: "".to_string(),
            seller: None,
            agent: None,
            is_available: true,
            created_at: crate::utils::now(),
        }
    }

    fn listings() -> Vec<PropertyData> {
        vec![
            property(1, "apartment", 5_000_000, 900, 2, "Pune"),
            property(2, "villa", 25_000_000, 3200, 5, "Goa"),
            property(3, "apartment", 5_200_000, 950, 2, "Mumbai"),
            property(4, "house", 9_000_000, 1800, 3, "Pune"),
        ]
    }

    fn pids(scored: &[Scored]) -> Vec<u64> {
        scored.iter().map(|s| s.property.pid).collect()
    }

    #[test]
    fn exact_match_comes_first() {
        let listings = listings();
        let prefs = Preferences {
            price: 5_000_000,
            area_sqft: Some(900),
            bedrooms: Some(2),
            kind: Some(PropertyKind::Apartment),
            city: Some("pune".to_string()),
            ..Default::default()
        };
        let ranked = rank(&prefs, &listings, DEFAULT_LIMIT);
        assert_eq!(pids(&ranked), vec![1, 3, 4, 2]);
        assert_eq!(ranked[0].distance, 0.0);
    }

    #[test]
    fn city_preference_reorders_close_prices() {
        let listings = listings();
        let prefs = Preferences {
            price: 5_100_000,
            city: Some("Mumbai".to_string()),
            ..Default::default()
        };
        assert_eq!(pids(&rank(&prefs, &listings, 2)), vec![3, 1]);
    }

    #[test]
    fn kind_mismatch_costs_more_than_any_scaled_gap() {
        let listings = listings();
        let prefs = Preferences {
            price: 25_000_000,
            kind: Some(PropertyKind::Apartment),
            ..Default::default()
        };
        let ranked = rank(&prefs, &listings, DEFAULT_LIMIT);
        assert_eq!(ranked[0].property.kind, "apartment");
    }

    #[test]
    fn limit_and_empty_input() {
        let listings = listings();
        let prefs = Preferences {
            price: 1,
            ..Default::default()
        };
        assert_eq!(rank(&prefs, &listings, 1).len(), 1);
        assert_eq!(rank(&prefs, &listings, 500).len(), 4);
        assert!(rank(&prefs, &[], DEFAULT_LIMIT).is_empty());
    }

    #[test]
    fn ranks_a_large_catalogue() {
        let kinds = ["apartment", "house", "villa", "plot", "commercial"];
        let listings: Vec<PropertyData> = (1..=5000u64)
            .map(|pid| {
                let i = pid as i64;
                property(
                    pid,
                    kinds[(pid % 5) as usize],
                    1_000_000 + i * 7_919 % 40_000_000,
                    400 + (i * 37 % 4000) as i32,
                    (i % 6) as i32,
                    if pid % 2 == 0 { "Pune" } else { "Goa" },
                )
            })
            .collect();
        let target = &listings[1230];
        let prefs = Preferences {
            price: target.price,
            area_sqft: Some(target.area_sqft),
            bedrooms: Some(target.bedrooms),
            bathrooms: Some(target.bathrooms),
            kind: Some(PropertyKind::House),
            city: Some(target.city.clone()),
        };
        assert_eq!(target.kind, "house");

        let ranked = rank(&prefs, &listings, MAX_LIMIT);
        assert_eq!(ranked.len(), MAX_LIMIT);
        assert_eq!(ranked[0].distance, 0.0);
        assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert_eq!(ranked[0].property.pid, target.pid);
    }

    #[test]
    fn identical_features_tie_break_on_pid() {
        let listings = vec![
            property(9, "plot", 100, 10, 0, "Delhi"),
            property(7, "plot", 100, 10, 0, "Delhi"),
        ];
        let prefs = Preferences {
            price: 100,
            ..Default::default()
        };
        assert_eq!(pids(&rank(&prefs, &listings, DEFAULT_LIMIT)), vec![7, 9]);
    }
}
