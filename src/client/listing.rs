use chrono::{DateTime, Utc};

use crate::models::ComplaintStatus;
use crate::models::dto::ComplaintResponse;

const MAX_SUGGESTIONS: usize = 10;
const MIN_SUGGESTION_QUERY: usize = 2;

/// Oldest first. The sort is stable, so equal timestamps keep their order.
pub fn sort_fifo(complaints: &mut [ComplaintResponse]) {
    complaints.sort_by_key(|c| c.complaint.created_at);
}

/// `M/D/YYYY`, the date form people type into the search box.
pub fn display_date(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    /// `None` shows every status.
    pub status: Option<ComplaintStatus>,
    pub search: String,
}

/// Case-insensitive substring match over number, subject, category name,
/// owner name (unless anonymous) and creation date.
pub fn matches_search(complaint: &ComplaintResponse, query: &str) -> bool {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return true;
    }

    searchable_values(complaint)
        .into_iter()
        .chain(std::iter::once(display_date(complaint.complaint.created_at)))
        .any(|value| value.to_lowercase().contains(&query))
}

fn searchable_values(complaint: &ComplaintResponse) -> Vec<String> {
    let mut values = vec![complaint.complaint.complaint_number.clone(), complaint.complaint.subject.clone()];

    if let Some(category) = &complaint.category {
        values.push(category.category_name.clone());
    }
    if !complaint.complaint.is_anonymous {
        if let Some(user) = &complaint.user {
            values.push(user.full_name.clone());
        }
    }

    values
}

/// Status filter, then search, then FIFO order.
pub fn apply_filters(complaints: &[ComplaintResponse], filter: &ListingFilter) -> Vec<ComplaintResponse> {
    let mut visible: Vec<ComplaintResponse> = complaints
        .iter()
        .filter(|c| filter.status.is_none_or(|status| c.complaint.status == status))
        .filter(|c| matches_search(c, &filter.search))
        .cloned()
        .collect();

    sort_fifo(&mut visible);
    visible
}

/// Up to ten distinct values that contain `query`, once it has two characters.
pub fn suggestions(complaints: &[ComplaintResponse], query: &str) -> Vec<String> {
    if query.chars().count() < MIN_SUGGESTION_QUERY {
        return Vec::new();
    }

    let query = query.to_lowercase();
    let mut found: Vec<String> = Vec::new();

    for value in complaints.iter().flat_map(searchable_values) {
        if value.to_lowercase().contains(&query) && !found.contains(&value) {
            found.push(value);
        }
    }

    found.truncate(MAX_SUGGESTIONS);
    found
}
