use crate::common::constants::ORDER_NUMBER_PREFIX;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Key the order ledger treats as the identity of a purchase. Two requests
/// for the same (user, project) pair always hash to the same key.
pub fn purchase_key(user_id: &str, project_id: Uuid) -> String {
    // Simple canonical string; can be evolved later
    let mut s = String::new();
    s.push_str(user_id);
    s.push('|');
    s.push_str(&project_id.to_string());

    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let out = hasher.finalize();
    hex::encode(out)
}

/// Human-referenceable order number: timestamp prefix plus a random suffix.
pub fn new_order_number(now: DateTime<Utc>) -> String {
    let suffix: u32 = rand::random::<u32>() & 0xFF_FFFF;
    format!(
        "{}-{}-{:06X}",
        ORDER_NUMBER_PREFIX,
        now.format("%Y%m%d%H%M%S"),
        suffix
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purchase_key_is_deterministic() {
        let project = Uuid::new_v4();
        let a = purchase_key("user-1", project);
        let b = purchase_key("user-1", project);
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_purchase_key_varies_by_pair() {
        let project = Uuid::new_v4();
        let other_project = Uuid::new_v4();
        assert_ne!(
            purchase_key("user-1", project),
            purchase_key("user-2", project)
        );
        assert_ne!(
            purchase_key("user-1", project),
            purchase_key("user-1", other_project)
        );
    }

    #[test]
    fn test_order_number_format() {
        let number = new_order_number(Utc::now());
        assert!(number.starts_with("ORD-"));
        assert_eq!(number.split('-').count(), 3);
    }
}
