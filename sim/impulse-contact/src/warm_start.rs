//! Carrying accumulated impulses from one substep to the next.
//!
//! Contacts are rebuilt from scratch every substep, so they have no stable
//! identity. A new contact inherits the impulses of the nearest cached
//! contact between the same two bodies, provided the points are close and the
//! normals agree.

use hashbrown::HashMap;
use impulse_types::BodyHandle;
use nalgebra::{Point3, Vector3};
use smallvec::SmallVec;

use crate::Contact;

/// Minimum cosine between matched normals.
pub const NORMAL_AGREEMENT: f64 = 0.95;

type PairKey = (Option<BodyHandle>, BodyHandle);

#[derive(Debug, Clone, Copy)]
struct CachedImpulse {
    point: Point3<f64>,
    normal: Vector3<f64>,
    normal_impulse: f64,
    tangent_impulse_1: f64,
    tangent_impulse_2: f64,
}

/// Impulses from the previous substep, keyed by body pair.
#[derive(Debug, Clone, Default)]
pub struct WarmStartCache {
    entries: HashMap<PairKey, SmallVec<[CachedImpulse; 8]>>,
}

impl WarmStartCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached contact points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(SmallVec::len).sum()
    }

    /// Whether nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Replace the cache with the solved `contacts`.
    pub fn store(&mut self, contacts: &[Contact]) {
        self.entries.clear();
        for contact in contacts {
            self.entries
                .entry((contact.body_a, contact.body_b))
                .or_default()
                .push(CachedImpulse {
                    point: contact.point,
                    normal: contact.normal,
                    normal_impulse: contact.accumulated_normal_impulse,
                    tangent_impulse_1: contact.accumulated_tangent_impulse_1,
                    tangent_impulse_2: contact.accumulated_tangent_impulse_2,
                });
        }
    }

    /// Seed `contacts` with matching cached impulses scaled by `factor`.
    ///
    /// Returns how many contacts were matched.
    pub fn apply(&self, contacts: &mut [Contact], max_distance: f64, factor: f64) -> usize {
        let max_distance_sq = max_distance * max_distance;
        let mut matched = 0;

        for contact in contacts.iter_mut() {
            let Some(cached) = self.entries.get(&(contact.body_a, contact.body_b)) else {
                continue;
            };
            let nearest = cached
                .iter()
                .filter(|c| c.normal.dot(&contact.normal) >= NORMAL_AGREEMENT)
                .map(|c| ((c.point - contact.point).norm_squared(), c))
                .filter(|(d, _)| *d <= max_distance_sq)
                .min_by(|(a, _), (b, _)| a.total_cmp(b));

            if let Some((_, c)) = nearest {
                contact.accumulated_normal_impulse = c.normal_impulse * factor;
                contact.accumulated_tangent_impulse_1 = c.tangent_impulse_1 * factor;
                contact.accumulated_tangent_impulse_2 = c.tangent_impulse_2 * factor;
                matched += 1;
            }
        }
        matched
    }
}
