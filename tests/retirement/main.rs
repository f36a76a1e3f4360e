mod support;

use std::sync::Arc;

use chrono::{Duration, Utc};
use lending_core::{
    in_memory_store, CollaboratorError, Conversation, ConversationRetirement,
    ExpiredListingCandidate, ExpiredListingRetirement, InMemoryStore, Listing, Passport,
    RetirementConfig, RetirementResult, SnapshotPassport,
};
use support::{
    CountingBlobStorage, CountingConversationReads, CountingListingReads, CountingUnitOfWork,
};

type Pipeline = ExpiredListingRetirement<CountingUnitOfWork<Listing>, CountingUnitOfWork<Conversation>>;

struct Stores {
    listings: Arc<InMemoryStore<Listing>>,
    conversations: Arc<InMemoryStore<Conversation>>,
}

impl Stores {
    fn new() -> Self {
        Stores {
            listings: in_memory_store(),
            conversations: in_memory_store(),
        }
    }

    /// Seeds an expired listing with one conversation.
    fn expired_listing(&self, images: &[&str]) -> ExpiredListingCandidate {
        let images: Vec<String> = images.iter().map(|path| path.to_string()).collect();
        let listing = self
            .listings
            .commit_new(
                Listing::create("sharer", "Camping gear", images.clone(), Utc::now() - Duration::days(400))
                    .unwrap(),
            )
            .unwrap();
        self.conversations
            .commit_new(Conversation::create(listing.id(), "sharer", "reserver").unwrap())
            .unwrap();
        ExpiredListingCandidate {
            id: listing.id().to_string(),
            images,
        }
    }

    fn listing_deleted(&self, id: &str) -> bool {
        self.listings.peek(id).unwrap().unwrap().is_deleted()
    }
}

fn pipeline(
    reads: Arc<CountingListingReads>,
    listing_uow: CountingUnitOfWork<Listing>,
    conversation_reads: Arc<CountingConversationReads>,
    conversation_uow: CountingUnitOfWork<Conversation>,
) -> Pipeline {
    let passport: Arc<dyn Passport> = Arc::new(SnapshotPassport::system());
    ExpiredListingRetirement::new(
        reads,
        listing_uow,
        ConversationRetirement::new(conversation_reads, conversation_uow, Arc::clone(&passport)),
        passport,
    )
}

fn plain_pipeline(stores: &Stores, candidates: Vec<ExpiredListingCandidate>) -> Pipeline {
    pipeline(
        Arc::new(CountingListingReads::new(candidates)),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)),
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    )
}

// =============================================================================
// Expired-listing pipeline
// =============================================================================

#[tokio::test]
async fn every_candidate_retired() {
    let stores = Stores::new();
    let candidates: Vec<_> = (0..3).map(|_| stores.expired_listing(&[])).collect();
    let expected_ids: Vec<String> = candidates.iter().map(|c| c.id.clone()).collect();

    let result = plain_pipeline(&stores, candidates).run().await.unwrap();

    assert_eq!(result.deleted_count, 3);
    assert_eq!(result.deleted_ids, expected_ids);
    assert_eq!(result.deleted_conversations_count, 3);
    assert!(result.errors.is_empty());
    for id in &expected_ids {
        assert!(stores.listing_deleted(id));
    }
}

#[tokio::test]
async fn one_failed_image_is_not_fatal() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&["a/1.png", "a/2.png"]);
    let blobs = Arc::new(CountingBlobStorage::new().failing_on("a/1.png"));

    let result = plain_pipeline(&stores, vec![candidate.clone()])
        .with_blob_storage(blobs.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(blobs.attempts(), 2);
    assert_eq!(result.deleted_images_count, 1);
    assert_eq!(result.deleted_count, 1);
    assert!(result.errors.is_empty());
    assert!(stores.listing_deleted(&candidate.id));
}

#[tokio::test]
async fn failed_listing_transaction_is_recorded_and_not_rolled_back() {
    let stores = Stores::new();
    let failing = stores.expired_listing(&["f/1.png"]);
    let healthy = stores.expired_listing(&[]);
    let blobs = Arc::new(CountingBlobStorage::new());

    let result = pipeline(
        Arc::new(CountingListingReads::new(vec![failing.clone(), healthy.clone()])),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)).failing_on(&failing.id),
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    )
    .with_blob_storage(blobs.clone())
    .run()
    .await
    .unwrap();

    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.deleted_ids, vec![healthy.id.clone()]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].entity_id, failing.id);

    // Images and conversations of the failed candidate stay removed.
    assert_eq!(result.deleted_images_count, 1);
    assert_eq!(result.deleted_conversations_count, 2);
    assert!(!stores.listing_deleted(&failing.id));
    assert!(!stores.listings.repo().is_locked(&failing.id).unwrap());
}

#[tokio::test]
async fn nothing_expired_touches_nothing() {
    let stores = Stores::new();
    let reads = Arc::new(CountingListingReads::new(Vec::new()));
    let conversation_reads = Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations)));
    let blobs = Arc::new(CountingBlobStorage::new());

    let pipeline = pipeline(
        reads.clone(),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)),
        conversation_reads.clone(),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    )
    .with_blob_storage(blobs.clone());

    let result = pipeline.run().await.unwrap();

    assert_eq!(result, RetirementResult::default());
    assert_eq!(reads.calls(), 1);
    assert_eq!(conversation_reads.calls(), 0);
    assert_eq!(pipeline.unit_of_work().transactions(), 0);
    assert_eq!(pipeline.conversations().unit_of_work().transactions(), 0);
    assert_eq!(blobs.attempts(), 0);
}

#[tokio::test]
async fn candidate_query_failure_is_returned() {
    let stores = Stores::new();
    let pipeline = pipeline(
        Arc::new(CountingListingReads::failing()),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)),
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    );

    let err = pipeline.run().await.unwrap_err();
    assert!(matches!(err, CollaboratorError::Backend(_)));
    assert_eq!(pipeline.unit_of_work().transactions(), 0);
}

#[tokio::test]
async fn conversation_lookup_failure_still_deletes_listing() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&[]);

    let result = pipeline(
        Arc::new(CountingListingReads::new(vec![candidate.clone()])),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)),
        Arc::new(
            CountingConversationReads::new(Arc::clone(&stores.conversations)).failing_for(&candidate.id),
        ),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.deleted_conversations_count, 0);
    assert!(result.errors.is_empty());
}

#[tokio::test]
async fn vanished_listing_is_recorded_as_not_found() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&[]);

    let result = pipeline(
        Arc::new(CountingListingReads::new(vec![candidate.clone()])),
        CountingUnitOfWork::new(Arc::clone(&stores.listings)).vanishing_on(&candidate.id),
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(result.deleted_count, 0);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(
        result.errors[0].error,
        CollaboratorError::NotFound {
            aggregate: "listing",
            id: candidate.id.clone(),
        }
    );
    assert!(!stores.listing_deleted(&candidate.id));
    assert!(!stores.listings.repo().is_locked(&candidate.id).unwrap());
}

#[tokio::test]
async fn bounded_fan_out_settles_every_deletion() {
    let stores = Stores::new();
    let paths = ["b/1.png", "b/2.png", "b/3.png", "b/4.png", "b/5.png"];
    let candidate = stores.expired_listing(&paths);
    let blobs = Arc::new(CountingBlobStorage::new().failing_on("b/3.png"));

    let result = plain_pipeline(&stores, vec![candidate])
        .with_blob_storage(blobs.clone())
        .with_config(RetirementConfig::new().with_max_concurrent_image_deletions(2))
        .run()
        .await
        .unwrap();

    assert_eq!(blobs.attempts(), 5);
    assert_eq!(result.deleted_images_count, 4);
    assert!(blobs.peak() <= 2);
    assert_eq!(result.deleted_count, 1);
}

#[tokio::test]
async fn unbounded_fan_out_runs_every_deletion_at_once() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&["u/1.png", "u/2.png", "u/3.png", "u/4.png"]);
    let blobs = Arc::new(CountingBlobStorage::new());

    let result = plain_pipeline(&stores, vec![candidate])
        .with_blob_storage(blobs.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(result.deleted_images_count, 4);
    assert_eq!(blobs.peak(), 4);
}

#[tokio::test]
async fn images_are_deleted_from_the_configured_container() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&["c/1.png"]);
    let blobs = Arc::new(CountingBlobStorage::new());

    plain_pipeline(&stores, vec![candidate])
        .with_blob_storage(blobs.clone())
        .with_config(RetirementConfig::new().with_image_container("archive"))
        .run()
        .await
        .unwrap();

    assert_eq!(blobs.deleted(), vec![("archive".to_string(), "c/1.png".to_string())]);
}

#[tokio::test]
async fn without_blob_storage_images_are_skipped() {
    let stores = Stores::new();
    let candidate = stores.expired_listing(&["s/1.png", "s/2.png"]);

    let result = plain_pipeline(&stores, vec![candidate]).run().await.unwrap();

    assert_eq!(result.deleted_images_count, 0);
    assert_eq!(result.deleted_count, 1);
}

#[tokio::test]
async fn run_honours_configured_batch_size() {
    let stores = Stores::new();
    let first = stores.expired_listing(&[]);
    let second = stores.expired_listing(&[]);

    let result = plain_pipeline(&stores, vec![first.clone(), second.clone()])
        .with_config(RetirementConfig::new().with_batch_size(1))
        .run()
        .await
        .unwrap();

    assert_eq!(result.deleted_ids, vec![first.id]);
    assert!(!stores.listing_deleted(&second.id));
}

// =============================================================================
// Conversation retirement
// =============================================================================

#[tokio::test]
async fn one_failing_conversation_does_not_stop_the_other() {
    let stores = Stores::new();
    let first = stores
        .conversations
        .commit_new(Conversation::create("listing-x", "sharer", "r1").unwrap())
        .unwrap();
    let second = stores
        .conversations
        .commit_new(Conversation::create("listing-x", "sharer", "r2").unwrap())
        .unwrap();

    let retirement = ConversationRetirement::new(
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)).failing_on(first.id()),
        Arc::new(SnapshotPassport::system()),
    );

    let result = retirement.retire_conversations_for_listing("listing-x").await.unwrap();

    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.deleted_ids, vec![second.id().to_string()]);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].entity_id, first.id());
    assert_eq!(retirement.unit_of_work().transactions(), 2);
}

#[tokio::test]
async fn no_conversations_opens_no_transaction() {
    let stores = Stores::new();
    let retirement = ConversationRetirement::new(
        Arc::new(CountingConversationReads::new(Arc::clone(&stores.conversations))),
        CountingUnitOfWork::new(Arc::clone(&stores.conversations)),
        Arc::new(SnapshotPassport::system()),
    );

    let result = retirement.retire_conversations_for_listing("empty").await.unwrap();

    assert_eq!(result.deleted_count, 0);
    assert!(result.errors.is_empty());
    assert_eq!(retirement.unit_of_work().transactions(), 0);
}
