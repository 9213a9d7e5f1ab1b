use sqlx::PgPool;

use super::types::*;

const REVIEW_COLUMNS: &str = "id, date, floor, room_number, guest_name, guest_phone, email, \
     internet, maintenance, reception, bathroom, laundry, security, \
     minimarket, lobby, restaurant, cleanliness, \
     how_did_you_hear, suggestions, created_at";

/// Insert a submission. Returns the new review ID.
pub async fn create(pool: &PgPool, review: &NewReview) -> Result<i64, sqlx::Error> {
    let r = &review.ratings;
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO reviews (date, floor, room_number, guest_name, guest_phone, email, \
             internet, maintenance, reception, bathroom, laundry, security, \
             minimarket, lobby, restaurant, cleanliness, how_did_you_hear, suggestions) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18) \
         RETURNING id",
    )
    .bind(&review.date)
    .bind(review.floor)
    .bind(review.room_number)
    .bind(&review.guest_name)
    .bind(&review.mobile_number)
    .bind(&review.email)
    .bind(r.internet)
    .bind(r.maintenance)
    .bind(r.reception)
    .bind(r.bathroom)
    .bind(r.laundry)
    .bind(r.security)
    .bind(r.minimarket)
    .bind(r.lobby)
    .bind(r.restaurant)
    .bind(r.cleanliness)
    .bind(&review.how_did_you_hear)
    .bind(&review.comments)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

pub async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(id) FROM reviews")
        .fetch_one(pool)
        .await
}

/// Row count and per-dimension means in a single pass.
/// `AVG` over INTEGER yields NUMERIC in Postgres, so each mean is cast to FLOAT8.
pub async fn summary(pool: &PgPool) -> Result<ReviewSummary, sqlx::Error> {
    sqlx::query_as::<_, ReviewSummary>(
        "SELECT COUNT(id) AS total, \
                AVG(internet)::FLOAT8 AS internet, \
                AVG(maintenance)::FLOAT8 AS maintenance, \
                AVG(reception)::FLOAT8 AS reception, \
                AVG(bathroom)::FLOAT8 AS bathroom, \
                AVG(laundry)::FLOAT8 AS laundry, \
                AVG(security)::FLOAT8 AS security, \
                AVG(minimarket)::FLOAT8 AS minimarket, \
                AVG(lobby)::FLOAT8 AS lobby, \
                AVG(restaurant)::FLOAT8 AS restaurant, \
                AVG(cleanliness)::FLOAT8 AS cleanliness \
         FROM reviews",
    )
    .fetch_one(pool)
    .await
}

/// Newest submissions first, at most `limit` rows.
pub async fn find_recent(pool: &PgPool, limit: i64) -> Result<Vec<Review>, sqlx::Error> {
    let sql = format!(
        "SELECT {} FROM reviews ORDER BY created_at DESC, id DESC LIMIT $1",
        REVIEW_COLUMNS
    );
    sqlx::query_as::<_, Review>(&sql)
        .bind(limit.max(0))
        .fetch_all(pool)
        .await
}
