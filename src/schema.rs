diesel::table! {
    admin_logins (token) {
        token -> Char,
        aid -> Char,
        login_time -> Datetime,
    }
}

diesel::table! {
    administrators (aid) {
        aid -> Char,
        password -> Char,
    }
}

diesel::table! {
    appointments (id) {
        id -> Unsigned<Bigint>,
        pid -> Unsigned<Bigint>,
        username -> Char,
        date -> Date,
        time -> Time,
        status -> Varchar,
        visit_type -> Varchar,
        vr_city -> Nullable<Varchar>,
        meeting_platform -> Nullable<Varchar>,
        meeting_link -> Nullable<Varchar>,
        notes -> Nullable<Text>,
        cancel_reason -> Nullable<Text>,
        feedback_rating -> Nullable<Tinyint>,
        feedback_comment -> Nullable<Text>,
        created_at -> Datetime,
        updated_at -> Datetime,
    }
}

diesel::table! {
    notifications (nid) {
        nid -> Unsigned<Bigint>,
        recipient_kind -> Varchar,
        recipient -> Char,
        kind -> Varchar,
        message -> Text,
        link -> Varchar,
        is_read -> Bool,
        created_at -> Datetime,
    }
}

diesel::table! {
    properties (pid) {
        pid -> Unsigned<Bigint>,
        title -> Varchar,
        description -> Text,
        kind -> Varchar,
        purpose -> Varchar,
        price -> Bigint,
        area_sqft -> Integer,
        bedrooms -> Integer,
        bathrooms -> Integer,
        city -> Varchar,
        address -> Varchar,
        seller -> Nullable<Char>,
        agent -> Nullable<Char>,
        is_available -> Bool,
        created_at -> Datetime,
    }
}

diesel::table! {
    user_logins (token) {
        token -> Char,
        username -> Char,
        login_time -> Datetime,
    }
}

diesel::table! {
    users (username) {
        username -> Char,
        password -> Char,
        name -> Varchar,
        email -> Varchar,
        telephone -> Varchar,
        is_client -> Bool,
        is_agent -> Bool,
        is_seller -> Bool,
        is_banned -> Bool,
        created_at -> Datetime,
    }
}

diesel::table! {
    wishlists (username, pid) {
        username -> Char,
        pid -> Unsigned<Bigint>,
        created_at -> Datetime,
    }
}

diesel::joinable!(appointments -> properties (pid));
diesel::joinable!(wishlists -> properties (pid));

diesel::allow_tables_to_appear_in_same_query!(
    admin_logins,
    administrators,
    appointments,
    notifications,
    properties,
    user_logins,
    users,
    wishlists,
);
