//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `migrations/` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered riders and bicycle owners.
    users (id) {
        id -> Uuid,
        display_name -> Varchar,
        /// Lowercased; unique.
        email -> Varchar,
        phone -> Varchar,
        date_of_birth -> Date,
        /// bcrypt hash; never selected outside the login path.
        password_hash -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rentable bicycles. `status` is either `available` or `rented`.
    bicycles (id) {
        id -> Uuid,
        owner_id -> Nullable<Uuid>,
        status -> Varchar,
        location -> Varchar,
        /// `{ "name", "type", "pricePerHour" }`
        gear -> Jsonb,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Rental transactions. A partial unique index allows one open rental per
    /// bicycle.
    rentals (id) {
        id -> Uuid,
        user_id -> Uuid,
        bicycle_id -> Uuid,
        started_at -> Timestamptz,
        ended_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    payments (id) {
        id -> Uuid,
        rental_id -> Uuid,
        user_id -> Uuid,
        amount -> Int8,
        card_last_four -> Varchar,
        status -> Varchar,
        paid_at -> Timestamptz,
    }
}

diesel::table! {
    feedback (id) {
        id -> Uuid,
        rental_id -> Uuid,
        user_id -> Uuid,
        body -> Text,
        rating -> Int2,
        submitted_at -> Timestamptz,
    }
}

diesel::joinable!(bicycles -> users (owner_id));
diesel::joinable!(rentals -> bicycles (bicycle_id));
diesel::joinable!(payments -> rentals (rental_id));
diesel::joinable!(feedback -> rentals (rental_id));

diesel::allow_tables_to_appear_in_same_query!(users, bicycles, rentals, payments, feedback);
