mod admin;
mod appointment;
mod auth;
mod config;
mod database;
mod error;
mod models;
mod notification;
mod property;
mod protocol;
mod schema;
mod user;
mod utils;
mod wishlist;

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;
use diesel::{r2d2::ConnectionManager, MysqlConnection};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;

pub type DbPool = r2d2::Pool<ConnectionManager<MysqlConnection>>;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    let manager = ConnectionManager::<MysqlConnection>::new(&settings.database_url);
    let pool = r2d2::Pool::builder()
        .max_size(settings.db_pool_size)
        .build(manager)
        .context("Failed to create DB pool")?;

    let bind = settings.bind_address.clone();
    tracing::info!(%bind, pool_size = settings.db_pool_size, "starting server");

    let pool = web::Data::new(pool);
    let settings = web::Data::new(settings);
    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(settings.clone())
            .app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
            .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
            .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
            .wrap(middleware::Logger::default())
            .service(
                web::scope("/api")
                    // user
                    .service(web::scope("/users").configure(user::config))
                    // administrator
                    .service(web::scope("/admin").configure(admin::config))
                    .service(web::scope("/properties").configure(property::config))
                    .service(web::scope("/appointments").configure(appointment::config))
                    .service(web::scope("/wishlist").configure(wishlist::config))
                    .service(web::scope("/notifications").configure(notification::config)),
            )
    })
    .bind(bind.as_str())
    .with_context(|| format!("Failed to bind {}", bind))?
    .run()
    .await
    .context("Server error")
}
