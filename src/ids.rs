//! Prefixed identifier generation.
//!
//! Every entity id is a short ASCII prefix plus lowercase hex, the same
//! scheme the teacher used for admin keys and webhook tokens
//! (`format!("chat_{:032x}", Uuid::new_v4().as_u128())`), just with the
//! prefixes and hex widths spec.md §3 calls normative.

fn hex_suffix(nibbles: usize) -> String {
    let upper = uuid::Uuid::new_v4().as_u128();
    format!("{upper:032x}")[..nibbles].to_string()
}

pub fn user_id() -> String {
    format!("usr_{}", hex_suffix(16))
}

pub fn room_id() -> String {
    format!("roo_{}", hex_suffix(12))
}

pub fn message_id() -> String {
    format!("msg_{}", hex_suffix(12))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefixes_and_widths() {
        assert!(user_id().starts_with("usr_"));
        assert_eq!(user_id().len(), 4 + 16);
        assert!(room_id().starts_with("roo_"));
        assert_eq!(room_id().len(), 4 + 12);
        assert!(message_id().starts_with("msg_"));
        assert_eq!(message_id().len(), 4 + 12);
    }

    #[test]
    fn ids_are_unique() {
        let a = message_id();
        let b = message_id();
        assert_ne!(a, b);
    }
}
