//! Turns tabular records into whitespace-joined text blobs for the
//! similarity scorers, and extracts the "best clients" profile used to
//! seed discovery queries.

use crate::clients::{Client, Segment};

/// One text per row, field values joined with single spaces.
/// Output order matches row order so scores can be reattached positionally.
pub fn build_corpus<T>(rows: &[T], fields: &[fn(&T) -> &str]) -> Vec<String> {
    rows.iter()
        .map(|row| {
            fields
                .iter()
                .map(|field| field(row))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn client_name(client: &Client) -> &str {
    &client.name
}

fn client_industry(client: &Client) -> &str {
    &client.industry
}

fn client_tags(client: &Client) -> &str {
    &client.tags
}

/// Text blob for one client: name, industry, free-text tags.
pub fn client_text(client: &Client) -> String {
    format!("{} {} {}", client.name, client.industry, client.tags)
}

pub fn client_corpus(clients: &[Client]) -> Vec<String> {
    build_corpus(clients, &[client_name, client_industry, client_tags])
}

#[derive(Debug, Clone, Default)]
pub struct ClientProfile {
    /// One text per selected client
    pub texts: Vec<String>,
    /// 3 most frequent industries among the selected clients
    pub top_industries: Vec<String>,
    /// 5 most frequent individual tag tokens
    pub top_tags: Vec<String>,
}

/// Count values preserving first-seen order; stable sort keeps that order
/// on ties.
fn top_by_frequency<'a, I: Iterator<Item = &'a str>>(values: I, top: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = vec![];
    for value in values {
        if value.is_empty() {
            continue;
        }
        match counts.iter_mut().find(|(v, _)| v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value.to_string(), 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(top).map(|(v, _)| v).collect()
}

/// Representative profile of the best clients: up to `top_n/2` highest
/// lifetime-value promotors plus up to `top_n/2` highest lifetime-value
/// overall, unioned without duplicates.
pub fn best_client_profile(clients: &[Client], top_n: usize) -> ClientProfile {
    let half = top_n / 2;

    let mut by_value: Vec<&Client> = clients.iter().collect();
    by_value.sort_by(|a, b| {
        b.lifetime_value
            .partial_cmp(&a.lifetime_value)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let top_promotors = by_value
        .iter()
        .filter(|c| c.segment == Segment::Promotor)
        .take(half);
    let top_overall = by_value.iter().take(half);

    let mut selected: Vec<&Client> = vec![];
    for client in top_promotors.chain(top_overall) {
        if !selected.iter().any(|c| c.id == client.id) {
            selected.push(client);
        }
    }

    ClientProfile {
        texts: selected.iter().map(|c| client_text(c)).collect(),
        top_industries: top_by_frequency(selected.iter().map(|c| c.industry.as_str()), 3),
        top_tags: top_by_frequency(
            selected.iter().flat_map(|c| c.tags.split_whitespace()),
            5,
        ),
    }
}
