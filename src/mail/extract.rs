//! Address extraction from free-form recipient text.
//!
//! Mail providers hand us recipients in several shapes at once: a bare
//! address, `"Display Name" <addr>`, comma-joined lists, or a structured
//! envelope blob with addresses embedded. Rather than parse each format we
//! scan for anything address-shaped.

use std::collections::HashSet;

use lazy_regex::regex;

/// Pull every `local@domain.tld`-shaped substring out of `text`,
/// lowercased, deduplicated, in first-seen order.
pub fn extract_addresses(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();

    for m in regex!(r"[a-z0-9._%+\-]+@[a-z0-9.\-]+\.[a-z]{2,}"i).find_iter(text) {
        let address = m.as_str().to_lowercase();
        if seen.insert(address.clone()) {
            out.push(address);
        }
    }

    out
}
