use uuid::Uuid;

/// An unordered pair of two distinct users.
///
/// Friendships and friend requests are relations on an unordered pair of users.
/// Normalizing the pair once, at construction, makes every storage lookup
/// direction-independent: `(a, b)` and `(b, a)` produce the same [UserPair]
/// and therefore the same storage key.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct UserPair {
    low: Uuid,
    high: Uuid,
}

impl UserPair {
    /// Normalize two user ids into a canonical pair.
    ///
    /// Returns [None] if both ids are the same user.
    pub fn new(a: Uuid, b: Uuid) -> Option<Self> {
        if a == b {
            return None;
        }

        let (low, high) = if a < b { (a, b) } else { (b, a) };

        Some(Self { low, high })
    }

    /// The smaller of the two ids
    pub fn low(&self) -> Uuid {
        self.low
    }

    /// The larger of the two ids
    pub fn high(&self) -> Uuid {
        self.high
    }

    /// The storage key of this pair.
    ///
    /// Unique constraints on this key deduplicate pair-wise rows regardless of
    /// the direction the pair was supplied in.
    pub fn key(&self) -> String {
        format!("{}:{}", self.low, self.high)
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::UserPair;

    #[test]
    fn pair_is_direction_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let ab = UserPair::new(a, b).unwrap();
        let ba = UserPair::new(b, a).unwrap();

        assert_eq!(ab, ba);
        assert_eq!(ab.key(), ba.key());
        assert!(ab.low() < ab.high());
    }

    #[test]
    fn self_pair_is_rejected() {
        let a = Uuid::new_v4();
        assert!(UserPair::new(a, a).is_none());
    }
}
