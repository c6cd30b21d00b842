//! BLAKE3 fingerprints.
//!
//! Paper IDs are positions in the submission list, so any reordering of a refreshed
//! snapshot silently renumbers papers. [`OrderFingerprint`] condenses the title
//! order into one value so two snapshots can be compared cheaply, and
//! [`detect_paper_id_drift`] reports where they first diverge.

use blake3::Hasher;

use crate::records::SubmissionRecord;

/// Computes a 64-bit hash of the input data using BLAKE3, truncated from 256 bits.
///
/// Used for deterministic seeds, not for identity.
#[inline]
pub fn hash_to_u64(data: &[u8]) -> u64 {
    let hash = blake3::hash(data);
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
/// Hash of an ordered title sequence.
pub struct OrderFingerprint([u8; 32]);

impl OrderFingerprint {
    /// Hashes `titles` in order. Each title is length-prefixed, so `["ab", "c"]`
    /// and `["a", "bc"]` differ.
    pub fn of_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Hasher::new();
        let mut count = 0u64;
        for title in titles {
            let title = title.as_ref();
            hasher.update(&(title.len() as u64).to_le_bytes());
            hasher.update(title.as_bytes());
            count += 1;
        }
        hasher.update(&count.to_le_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn of_submissions(submissions: &[SubmissionRecord]) -> Self {
        Self::of_titles(submissions.iter().map(|s| s.title.as_str()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// First 8 bytes as hex, for log lines.
    pub fn short_hex(&self) -> String {
        self.0[..8].iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for OrderFingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.short_hex())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Two submission snapshots assign paper IDs differently.
pub struct PaperIdDrift {
    pub previous: OrderFingerprint,
    pub current: OrderFingerprint,
    /// First paper ID whose title changed, or `None` if papers were only dropped
    /// from the end.
    pub first_changed: Option<usize>,
    pub previous_count: usize,
    pub current_count: usize,
}

/// Compares the title order of two snapshots.
///
/// Returns `None` when every previously issued paper ID still names the same title.
/// Papers appended at the end get fresh IDs and do not count as drift.
pub fn detect_paper_id_drift(
    previous: &[SubmissionRecord],
    current: &[SubmissionRecord],
) -> Option<PaperIdDrift> {
    let before = OrderFingerprint::of_submissions(previous);
    let after = OrderFingerprint::of_submissions(current);
    if before == after {
        return None;
    }

    let first_changed = previous
        .iter()
        .zip(current)
        .position(|(a, b)| a.title != b.title)
        .map(|idx| idx + 1);
    if first_changed.is_none() && current.len() >= previous.len() {
        return None;
    }

    Some(PaperIdDrift {
        previous: before,
        current: after,
        first_changed,
        previous_count: previous.len(),
        current_count: current.len(),
    })
}
