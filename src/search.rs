use crate::models::Client;

/// Clients whose name contains `query` (ignoring case) or whose phone number
/// contains it, in collection order. An empty query matches everyone.
pub fn filter_clients<'a>(clients: &'a [Client], query: &str) -> Vec<&'a Client> {
    if query.is_empty() {
        return clients.iter().collect();
    }

    let needle = query.to_lowercase();
    clients
        .iter()
        .filter(|client| {
            client.name.to_lowercase().contains(&needle)
                || client
                    .phone
                    .as_deref()
                    .is_some_and(|phone| phone.contains(query))
        })
        .collect()
}
