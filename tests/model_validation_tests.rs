use chrono::Utc;
use lostfound_portal::models::{
    ContactPreference, FoundItemRow, Item, ItemStatus, ItemType, LostItemRow, UpdateItemRequest,
    UrgencyLevel, full_name,
};
use uuid::Uuid;

// --- Status vocabulary normalization ---

#[test]
fn status_normalizes_both_table_vocabularies() {
    assert_eq!(ItemStatus::from_db("ACTIVE"), ItemStatus::Active);
    assert_eq!(ItemStatus::from_db("AVAILABLE"), ItemStatus::Active);
    assert_eq!(ItemStatus::from_db("RESOLVED"), ItemStatus::Resolved);
    assert_eq!(ItemStatus::from_db("CLAIMED"), ItemStatus::Resolved);
    assert_eq!(ItemStatus::from_db("REJECTED"), ItemStatus::Rejected);
    assert_eq!(ItemStatus::from_db("ARCHIVED"), ItemStatus::Archived);
}

#[test]
fn status_renders_into_each_tables_vocabulary() {
    assert_eq!(ItemStatus::Active.to_db(ItemType::Lost), "ACTIVE");
    assert_eq!(ItemStatus::Active.to_db(ItemType::Found), "AVAILABLE");
    assert_eq!(ItemStatus::Resolved.to_db(ItemType::Lost), "RESOLVED");
    assert_eq!(ItemStatus::Resolved.to_db(ItemType::Found), "CLAIMED");
    assert_eq!(ItemStatus::Rejected.to_db(ItemType::Found), "REJECTED");
    assert_eq!(ItemStatus::Archived.to_db(ItemType::Lost), "ARCHIVED");
}

#[test]
fn status_round_trips_through_either_table() {
    for status in [
        ItemStatus::Active,
        ItemStatus::Resolved,
        ItemStatus::Rejected,
        ItemStatus::Archived,
    ] {
        for table in [ItemType::Lost, ItemType::Found] {
            assert_eq!(ItemStatus::from_db(status.to_db(table)), status);
        }
    }
}

#[test]
fn status_serializes_to_the_canonical_lowercase_vocabulary() {
    assert_eq!(
        serde_json::to_string(&ItemStatus::Active).unwrap(),
        "\"active\""
    );
    assert_eq!(
        serde_json::to_string(&ItemStatus::Resolved).unwrap(),
        "\"resolved\""
    );
}

// --- Serde shapes ---

#[test]
fn item_serializes_type_discriminant_as_type() {
    let item = Item {
        item_type: ItemType::Found,
        ..Item::default()
    };
    let json = serde_json::to_string(&item).unwrap();
    // The reserved-word rename must hold on the wire.
    assert!(json.contains(r#""type":"found""#));
    assert!(!json.contains("item_type"));
}

#[test]
fn lost_item_omits_found_only_fields() {
    let item = Item::default();
    let json = serde_json::to_string(&item).unwrap();
    assert!(!json.contains("current_location"));
    assert!(!json.contains("condition_notes"));
}

#[test]
fn update_request_optionality_supports_partial_patches() {
    let partial = UpdateItemRequest {
        title: Some("New Title Only".to_string()),
        ..UpdateItemRequest::default()
    };

    let json = serde_json::to_string(&partial).unwrap();
    assert!(json.contains(r#""title":"New Title Only""#));
    // None fields are omitted, so an absent key means "no change".
    assert!(!json.contains("description"));
    assert!(!json.contains("status"));

    let empty: UpdateItemRequest = serde_json::from_str("{}").unwrap();
    assert!(empty.is_empty());
}

// --- Dual-table unification ---

fn lost_row() -> LostItemRow {
    LostItemRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "Blue backpack".to_string(),
        description: "Lost near the gym".to_string(),
        category_name: Some("Electronics".to_string()),
        location_name: Some("Gym".to_string()),
        images: None,
        reward_amount: Some(25.0),
        urgency: "HIGH".to_string(),
        date_lost: None,
        time_lost: None,
        contact_method: "PHONE".to_string(),
        contact_info: Some("lena@umt.edu".to_string()),
        status: "ACTIVE".to_string(),
        flagged: false,
        flag_reason: None,
        moderation_notes: None,
        moderated_by: None,
        moderated_at: None,
        view_count: 3,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        owner_first_name: Some("Lena".to_string()),
        owner_last_name: Some("Marlin".to_string()),
    }
}

fn found_row() -> FoundItemRow {
    FoundItemRow {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        title: "Silver ring".to_string(),
        description: "Found at the fountain".to_string(),
        category_name: None,
        location_name: None,
        images: Some(vec!["http://cdn/img1.png".to_string()]),
        current_location: Some("Front desk".to_string()),
        condition_notes: Some("Good condition".to_string()),
        date_found: None,
        time_found: None,
        contact_method: "EMAIL".to_string(),
        contact_info: None,
        status: "AVAILABLE".to_string(),
        flagged: true,
        flag_reason: Some("duplicate".to_string()),
        moderation_notes: None,
        moderated_by: None,
        moderated_at: None,
        view_count: 0,
        created_at: Utc::now(),
        updated_at: Utc::now(),
        owner_first_name: None,
        owner_last_name: None,
    }
}

#[test]
fn lost_row_unifies_with_type_specific_fields() {
    let item = Item::from_lost(lost_row(), "http://localhost:3000");

    assert_eq!(item.item_type, ItemType::Lost);
    assert_eq!(item.category, "electronics");
    assert_eq!(item.location, "Gym");
    assert_eq!(item.reward, 25.0);
    assert_eq!(item.urgency, UrgencyLevel::High);
    assert_eq!(item.contact_preference, ContactPreference::Phone);
    assert_eq!(item.status, ItemStatus::Active);
    assert_eq!(item.owner_name, "Lena Marlin");
    assert_eq!(item.owner_email, "lena@umt.edu");
    // No image attached: the placeholder URL steps in.
    assert_eq!(item.image, "http://localhost:3000/placeholder/400x300");
    assert!(item.current_location.is_none());
}

#[test]
fn found_row_unifies_with_effective_defaults() {
    let item = Item::from_found(found_row(), "http://localhost:3000");

    assert_eq!(item.item_type, ItemType::Found);
    // Found items never carry a reward and report Medium urgency.
    assert_eq!(item.reward, 0.0);
    assert_eq!(item.urgency, UrgencyLevel::Medium);
    // AVAILABLE normalizes to the canonical active.
    assert_eq!(item.status, ItemStatus::Active);
    // Missing lookups degrade to the defaults.
    assert_eq!(item.category, "other");
    assert_eq!(item.location, "Unknown");
    assert_eq!(item.owner_name, "Unknown");
    assert_eq!(item.owner_email, "Unknown");
    // First attached image wins over the placeholder.
    assert_eq!(item.image, "http://cdn/img1.png");
    assert_eq!(item.current_location.as_deref(), Some("Front desk"));
    // Moderation metadata rides along orthogonally.
    assert!(item.flagged);
    assert_eq!(item.flag_reason.as_deref(), Some("duplicate"));
}

// --- Helpers ---

#[test]
fn full_name_joins_and_degrades() {
    assert_eq!(full_name(Some("Ada"), Some("Byron")), "Ada Byron");
    assert_eq!(full_name(Some("Ada"), None), "Ada");
    assert_eq!(full_name(None, Some("Byron")), "Byron");
    assert_eq!(full_name(None, None), "Unknown");
    assert_eq!(full_name(Some("  "), Some("")), "Unknown");
}

#[test]
fn urgency_and_contact_round_trip_their_db_forms() {
    assert_eq!(UrgencyLevel::from_db(UrgencyLevel::High.to_db()), UrgencyLevel::High);
    assert_eq!(UrgencyLevel::from_db("unexpected"), UrgencyLevel::Medium);
    assert_eq!(
        ContactPreference::from_db(ContactPreference::Phone.to_db()),
        ContactPreference::Phone
    );
    assert_eq!(ContactPreference::from_db("junk"), ContactPreference::Email);
}
