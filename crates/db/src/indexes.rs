use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

use crate::models::{Meeting, MeetingRequest, Mentorship, MentorshipRequest, Notification, User};

/// Indexes backing the dashboard feeds. Every feed is keyed by the mentor or
/// recipient id, then filtered by status or date.
pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    create_indexes(
        db,
        User::COLLECTION,
        vec![
            index_unique(bson::doc! { "email": 1 }),
            index(bson::doc! { "role": 1, "display_name": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        MentorshipRequest::COLLECTION,
        vec![
            index(bson::doc! { "mentor_id": 1, "status": 1, "created_at": -1 }),
            index(bson::doc! { "student_id": 1, "created_at": -1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        Mentorship::COLLECTION,
        vec![
            index(bson::doc! { "mentor_id": 1, "updated_at": -1 }),
            index(bson::doc! { "student_id": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        Meeting::COLLECTION,
        vec![
            index(bson::doc! { "mentor_id": 1, "date_timestamp": 1 }),
            index(bson::doc! { "student_id": 1, "date_timestamp": 1 }),
            index(bson::doc! { "from_request_id": 1 }),
        ],
    )
    .await?;

    create_indexes(
        db,
        MeetingRequest::COLLECTION,
        vec![index(
            bson::doc! { "mentor_id": 1, "status": 1, "request_timestamp": -1 },
        )],
    )
    .await?;

    create_indexes(
        db,
        Notification::COLLECTION,
        vec![index(
            bson::doc! { "recipient_id": 1, "read_at": 1, "timestamp": -1 },
        )],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    db.collection::<bson::Document>(collection)
        .create_indexes(indexes)
        .await?;
    info!(collection, "Indexes created");
    Ok(())
}
