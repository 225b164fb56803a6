//! SQLite-backed search behavior: matching, ordering, pagination, filters,
//! and listing lifecycle (flags, cascade delete, upsert).

use properti_search::model::{
    LegalStatus, ListingFlag, ListingStatus, NewInquiry, NewListing,
};
use properti_search::search::builder::{SearchRequest, SearchService};
use properti_search::storage::sqlite::SqliteStore;
use rusqlite::params;

fn store() -> SqliteStore {
    SqliteStore::open_in_memory().unwrap()
}

/// Insert a listing and pin its creation timestamp so ordering is
/// deterministic in tests.
fn seed(store: &SqliteStore, listing: &NewListing, created_at: i64) {
    store.insert_listing(listing).unwrap();
    store
        .raw()
        .execute(
            "UPDATE listings SET created_at = ?1, updated_at = ?1 WHERE kode_properti = ?2",
            params![created_at, listing.code],
        )
        .unwrap();
}

fn kaliurang_house() -> NewListing {
    let mut l = NewListing::new("KAL001", "Rumah di Jl. Kaliurang", ListingStatus::ForSale);
    l.description = Some("Hunian asri dekat kampus".into());
    l.property_type = Some("rumah".into());
    l.address = Some("Jl. Kaliurang KM 7".into());
    l.city = Some("Sleman".into());
    l.province = Some("DI Yogyakarta".into());
    l.price = Some(1_250_000_000);
    l.bedrooms = Some(3);
    l.bathrooms = Some(2);
    l.land_area = Some(150);
    l.building_area = Some(90);
    l.legal_status = Some(LegalStatus::Shm);
    l
}

fn search_codes(store: &SqliteStore, request: &SearchRequest) -> Vec<String> {
    let service = SearchService::new(store);
    let page = service.search(request).unwrap();
    page.listings.into_iter().map(|l| l.code).collect()
}

fn keyword_request(keyword: &str) -> SearchRequest {
    SearchRequest {
        keyword: keyword.into(),
        page_size: 20,
        ..Default::default()
    }
}

#[test]
fn title_substring_matches_case_insensitively() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);
    seed(
        &store,
        &NewListing::new("BTL001", "Tanah di Bantul", ListingStatus::ForSale),
        2_000,
    );

    assert_eq!(
        search_codes(&store, &keyword_request("KALIURANG")),
        vec!["KAL001"]
    );
    assert_eq!(
        search_codes(&store, &keyword_request("kaliurang")),
        vec!["KAL001"]
    );
}

#[test]
fn code_match_is_independent_of_title_and_description() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);

    // neither title nor description contains the code string
    assert_eq!(
        search_codes(&store, &keyword_request("KAL001")),
        vec!["KAL001"]
    );
}

#[test]
fn out_of_order_words_still_match() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);

    // phrase "kaliurang rumah" is not a substring of anything, but both
    // words expand individually
    assert_eq!(
        search_codes(&store, &keyword_request("kaliurang rumah")),
        vec!["KAL001"]
    );
}

#[test]
fn wildcards_in_keyword_pass_through() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);

    let mut promo = NewListing::new("PRM001", "Ruko Promo 100% Strategis", ListingStatus::ForSale);
    promo.city = Some("Bantul".into());
    seed(&store, &promo, 2_000);

    // literal `%` works, and also acts as a LIKE wildcard
    assert_eq!(
        search_codes(&store, &keyword_request("100%")),
        vec!["PRM001"]
    );
    // `_` matches any single char: r_mah hits "rumah"
    assert_eq!(
        search_codes(&store, &keyword_request("r_mah")),
        vec!["KAL001"]
    );
}

#[test]
fn empty_keyword_lists_everything_newest_first() {
    let store = store();
    seed(
        &store,
        &NewListing::new("A", "Alpha", ListingStatus::ForSale),
        1_000,
    );
    seed(
        &store,
        &NewListing::new("B", "Beta", ListingStatus::ForRent),
        3_000,
    );
    seed(
        &store,
        &NewListing::new("C", "Gamma", ListingStatus::ForSale),
        2_000,
    );

    assert_eq!(
        search_codes(&store, &keyword_request("   ")),
        vec!["B", "C", "A"]
    );
}

#[test]
fn sold_listings_are_excluded_unless_requested() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);
    store.set_flag("KAL001", ListingFlag::Sold, true).unwrap();

    assert!(search_codes(&store, &keyword_request("kaliurang")).is_empty());

    let mut request = keyword_request("kaliurang");
    request.filters.include_sold = true;
    assert_eq!(search_codes(&store, &request), vec!["KAL001"]);

    // flipping the flag back restores visibility
    store.set_flag("KAL001", ListingFlag::Sold, false).unwrap();
    assert_eq!(
        search_codes(&store, &keyword_request("kaliurang")),
        vec!["KAL001"]
    );
}

#[test]
fn structured_filters_combine_with_keyword() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);

    let mut request = keyword_request("kaliurang");
    request.filters.status = Some(ListingStatus::ForSale);
    request.filters.min_price = Some(1_000_000_000);
    request.filters.max_price = Some(2_000_000_000);
    request.filters.min_bedrooms = Some(3);
    request.filters.legal_status = Some(LegalStatus::Shm);
    request.filters.province = Some("di yogyakarta".into());
    request.filters.city = Some("Sleman".into());
    assert_eq!(search_codes(&store, &request), vec!["KAL001"]);

    // a conflicting filter excludes the row despite the keyword match
    request.filters.min_price = Some(5_000_000_000);
    assert!(search_codes(&store, &request).is_empty());
}

#[test]
fn area_and_type_filters() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);
    let mut land = NewListing::new("TNH001", "Tanah Kavling Kaliurang", ListingStatus::ForSale);
    land.property_type = Some("tanah".into());
    land.land_area = Some(500);
    seed(&store, &land, 2_000);

    let mut request = keyword_request("kaliurang");
    request.filters.property_type = Some("Tanah".into());
    assert_eq!(search_codes(&store, &request), vec!["TNH001"]);

    let mut request = keyword_request("kaliurang");
    request.filters.min_land_area = Some(200);
    request.filters.max_land_area = Some(600);
    assert_eq!(search_codes(&store, &request), vec!["TNH001"]);

    let mut request = keyword_request("kaliurang");
    request.filters.min_building_area = Some(50);
    assert_eq!(search_codes(&store, &request), vec!["KAL001"]);
}

#[test]
fn pagination_pages_are_disjoint_and_complete() {
    let store = store();
    for n in 0..5 {
        seed(
            &store,
            &NewListing::new(format!("L{n}"), "Rumah Murah", ListingStatus::ForSale),
            1_000 + n,
        );
    }

    let service = SearchService::new(&store);
    let page = |offset: u32, page_size: u32| {
        service
            .search(&SearchRequest {
                keyword: "rumah".into(),
                offset,
                page_size,
                ..Default::default()
            })
            .unwrap()
    };

    let first = page(0, 2);
    let second = page(2, 2);
    let third = page(4, 2);

    assert_eq!(first.listings.len(), 2);
    assert_eq!(first.next_cursor, Some(2));
    assert_eq!(second.listings.len(), 2);
    assert_eq!(second.next_cursor, Some(4));
    assert_eq!(third.listings.len(), 1);
    assert_eq!(third.next_cursor, None);

    let paged: Vec<String> = first
        .listings
        .iter()
        .chain(&second.listings)
        .chain(&third.listings)
        .map(|l| l.code.clone())
        .collect();
    let direct: Vec<String> = page(0, 20).listings.iter().map(|l| l.code.clone()).collect();
    assert_eq!(paged, direct);

    let mut unique = paged.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), 5);
}

#[test]
fn full_final_page_reports_probable_next_then_empty() {
    let store = store();
    for n in 0..4 {
        seed(
            &store,
            &NewListing::new(format!("L{n}"), "Rumah", ListingStatus::ForSale),
            1_000 + n,
        );
    }

    let service = SearchService::new(&store);
    let second = service
        .search(&SearchRequest {
            keyword: "rumah".into(),
            offset: 2,
            page_size: 2,
            ..Default::default()
        })
        .unwrap();
    // the page is full, so a following page is assumed without a count probe
    assert_eq!(second.next_cursor, Some(4));

    let third = service
        .search(&SearchRequest {
            keyword: "rumah".into(),
            offset: 4,
            page_size: 2,
            ..Default::default()
        })
        .unwrap();
    assert!(third.listings.is_empty());
    assert_eq!(third.next_cursor, None);
}

#[test]
fn optional_total_count_covers_all_pages() {
    let store = store();
    for n in 0..5 {
        seed(
            &store,
            &NewListing::new(format!("L{n}"), "Rumah", ListingStatus::ForSale),
            1_000 + n,
        );
    }

    let service = SearchService::new(&store);
    let page = service
        .search(&SearchRequest {
            keyword: "rumah".into(),
            page_size: 2,
            with_count: true,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(page.listings.len(), 2);
    assert_eq!(page.total, Some(5));

    let without = service
        .search(&SearchRequest {
            keyword: "rumah".into(),
            page_size: 2,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(without.total, None);
}

#[test]
fn empty_result_is_not_an_error() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);

    let service = SearchService::new(&store);
    let page = service
        .search(&keyword_request("tidak ada yang cocok sama sekali"))
        .unwrap();
    assert!(page.listings.is_empty());
    assert_eq!(page.next_cursor, None);
}

#[test]
fn upsert_updates_by_code_without_duplicating() {
    let mut store = store();
    let original = kaliurang_house();
    store.insert_listing(&original).unwrap();
    let before = store.get_by_code("KAL001").unwrap().unwrap();

    let mut updated = original.clone();
    updated.title = "Rumah Direnovasi di Jl. Kaliurang".into();
    updated.price = Some(1_400_000_000);
    store.import_listings(std::slice::from_ref(&updated)).unwrap();

    let after = store.get_by_code("KAL001").unwrap().unwrap();
    assert_eq!(after.id, before.id);
    assert_eq!(after.title, "Rumah Direnovasi di Jl. Kaliurang");
    assert_eq!(after.price, Some(1_400_000_000));
    assert_eq!(after.created_at, before.created_at);

    let all = store.all_listings().unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn duplicate_insert_fails_but_upsert_succeeds() {
    let store = store();
    store.insert_listing(&kaliurang_house()).unwrap();
    assert!(store.insert_listing(&kaliurang_house()).is_err());
    assert!(store.upsert_listing(&kaliurang_house()).is_ok());
}

#[test]
fn delete_cascades_to_inquiries() {
    let store = store();
    seed(&store, &kaliurang_house(), 1_000);
    seed(
        &store,
        &NewListing::new("BTL001", "Tanah di Bantul", ListingStatus::ForSale),
        2_000,
    );

    for n in 0..3 {
        store
            .insert_inquiry(
                "KAL001",
                &NewInquiry {
                    name: format!("Budi {n}"),
                    phone: Some("0812".into()),
                    message: Some("Masih tersedia?".into()),
                },
            )
            .unwrap();
    }
    store
        .insert_inquiry(
            "BTL001",
            &NewInquiry {
                name: "Sari".into(),
                phone: None,
                message: None,
            },
        )
        .unwrap();

    assert_eq!(store.count_inquiries("KAL001").unwrap(), 3);
    let inquiries = store.inquiries_for("KAL001").unwrap();
    assert_eq!(inquiries.len(), 3);
    assert!(inquiries.iter().all(|i| i.message.as_deref() == Some("Masih tersedia?")));

    assert!(store.delete_listing("KAL001").unwrap());

    assert!(store.get_by_code("KAL001").unwrap().is_none());
    // only the other listing's inquiry survives
    assert_eq!(store.total_inquiries().unwrap(), 1);
    assert_eq!(store.count_inquiries("BTL001").unwrap(), 1);
}

#[test]
fn inquiry_for_unknown_code_fails() {
    let store = store();
    let err = store
        .insert_inquiry(
            "NOPE",
            &NewInquiry {
                name: "Budi".into(),
                phone: None,
                message: None,
            },
        )
        .unwrap_err();
    assert!(err.to_string().contains("NOPE"));
}

#[test]
fn flag_flip_on_unknown_code_reports_false() {
    let store = store();
    assert!(!store.set_flag("NOPE", ListingFlag::Featured, true).unwrap());
    assert!(!store.delete_listing("NOPE").unwrap());
}
