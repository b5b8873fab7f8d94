//! Concurrency models that map work to execution domains.
//!
//! A backend only answers "which domain owns this?". The scheduler owns the
//! domains themselves and is identical under both models.

use std::fmt;

use spell_core::Location;

/// Index of an execution domain inside the scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub usize);

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "domain#{}", self.0)
    }
}

pub trait SchedulerBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Total number of domains the scheduler must spawn.
    fn domain_count(&self) -> usize;

    /// The single authoritative domain.
    fn global(&self) -> DomainId;

    /// Domain owning `location` at this instant.
    fn region(&self, location: &Location) -> DomainId;
}

/// One authoritative domain for all world-touching work.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClassicBackend;

impl SchedulerBackend for ClassicBackend {
    fn name(&self) -> &'static str {
        "classic"
    }

    fn domain_count(&self) -> usize {
        1
    }

    fn global(&self) -> DomainId {
        DomainId(0)
    }

    fn region(&self, _location: &Location) -> DomainId {
        DomainId(0)
    }
}

/// A global domain plus `partitions` region-owning domains.
///
/// Regions are `2^region_shift` chunks wide and are hashed onto partitions, so
/// neighbouring regions usually land on different domains.
#[derive(Clone, Copy, Debug)]
pub struct RegionalBackend {
    partitions: usize,
    region_shift: u32,
}

impl RegionalBackend {
    pub fn new(partitions: usize, region_shift: u32) -> Self {
        Self {
            partitions: partitions.max(1),
            region_shift,
        }
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }
}

impl SchedulerBackend for RegionalBackend {
    fn name(&self) -> &'static str {
        "regional"
    }

    fn domain_count(&self) -> usize {
        self.partitions + 1
    }

    fn global(&self) -> DomainId {
        DomainId(0)
    }

    fn region(&self, location: &Location) -> DomainId {
        let region = location.region(self.region_shift);
        let hash = i64::from(region.x).wrapping_mul(73_856_093)
            ^ i64::from(region.z).wrapping_mul(19_349_663)
            ^ i64::from(region.world.0).wrapping_mul(83_492_791);
        let partition = hash.rem_euclid(self.partitions as i64) as usize;
        DomainId(1 + partition)
    }
}

#[cfg(test)]
mod tests {
    use spell_core::WorldId;

    use super::*;

    #[test]
    fn classic_collapses_everything_onto_one_domain() {
        let backend = ClassicBackend;
        let far = Location::new(WorldId(3), 1.0e6, 0.0, -1.0e6);
        assert_eq!(backend.region(&far), backend.global());
        assert_eq!(backend.domain_count(), 1);
    }

    #[test]
    fn regional_keeps_global_separate_from_regions() {
        let backend = RegionalBackend::new(4, 3);
        let origin = Location::new(WorldId(0), 0.0, 64.0, 0.0);
        let east = Location::new(WorldId(0), 200.0, 64.0, 0.0);

        assert_eq!(backend.domain_count(), 5);
        assert_eq!(backend.region(&origin), DomainId(1));
        assert_eq!(backend.region(&east), DomainId(2));
        for x in -5..5 {
            let loc = Location::new(WorldId(0), x as f64 * 300.0, 0.0, -77.0);
            let domain = backend.region(&loc);
            assert!(domain.0 >= 1 && domain.0 <= 4);
        }
    }

    #[test]
    fn same_region_maps_to_same_domain() {
        let backend = RegionalBackend::new(8, 3);
        let a = Location::new(WorldId(0), 1.0, 64.0, 1.0);
        let b = Location::new(WorldId(0), 120.0, 10.0, 100.0);
        assert_eq!(backend.region(&a), backend.region(&b));
    }
}
