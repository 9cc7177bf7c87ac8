use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_DECLARATION: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a function declaration.
///
/// Two textually identical lambdas get distinct ids, so their
/// specializations never alias in the definition cache.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Debug)]
pub struct DeclarationId(u64);

impl DeclarationId {
    /// Allocate the next identifier. Monotonic for the life of the process.
    pub fn fresh() -> Self {
        DeclarationId(NEXT_DECLARATION.fetch_add(1, Ordering::Relaxed))
    }

    /// Little-endian bytes, as embedded in structural signatures.
    #[inline]
    pub const fn to_bytes(self) -> [u8; 8] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_are_distinct_and_increasing() {
        let a = DeclarationId::fresh();
        let b = DeclarationId::fresh();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn fresh_ids_are_unique_across_threads() {
        let ids: Vec<DeclarationId> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| (0..256).map(|_| DeclarationId::fresh()).collect::<Vec<_>>()))
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().unwrap_or_default())
                .collect()
        });
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), ids.len());
    }
}
