pub mod types;

pub use types::{
    Inquiry, LegalStatus, Listing, ListingFilters, ListingFlag, ListingStatus, NewInquiry,
    NewListing,
};
