use crate::skill::{SkillPool, Specialty};
use crate::team::TeamMember;
use std::collections::BTreeMap;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct MemberCapacity {
    pub user_id: String,
    pub specialty: Specialty,
    /// Full per-sprint capacity, used to turn points into days.
    pub total: f64,
    pub remaining: f64,
}

/// Capacity left in one sprint: per pool, and per person.
///
/// Snapshots are never modified in place; [`SkillCapacity::reserve`] hands
/// back the successor snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SkillCapacity {
    pools: BTreeMap<SkillPool, f64>,
    members: Vec<MemberCapacity>,
}

impl SkillCapacity {
    pub fn pool_remaining(&self, pool: SkillPool) -> f64 {
        self.pools.get(&pool).copied().unwrap_or(0.0)
    }

    pub fn pools(&self) -> impl Iterator<Item = (SkillPool, f64)> + '_ {
        self.pools.iter().map(|(pool, points)| (*pool, *points))
    }

    pub fn members(&self) -> &[MemberCapacity] {
        &self.members
    }

    pub fn pool_can_fit(&self, pool: SkillPool, points: u32) -> bool {
        self.pool_remaining(pool) + EPSILON >= f64::from(points)
    }

    /// First member, in roster order, able to take `points` of `pool` work.
    /// With an `owner`, nobody else is considered.
    pub fn find_member(&self, pool: SkillPool, points: u32, owner: Option<&str>) -> Option<usize> {
        let needed = f64::from(points);
        self.members.iter().position(|member| {
            owner.is_none_or(|owner| member.user_id == owner)
                && member.specialty.serves(pool)
                && member.remaining + EPSILON >= needed
        })
    }

    /// Snapshot after charging `points` to `pool` and to member `member_idx`.
    pub fn reserve(&self, pool: SkillPool, member_idx: usize, points: u32) -> SkillCapacity {
        let charged = f64::from(points);
        let mut next = self.clone();
        *next.pools.entry(pool).or_insert(0.0) -= charged;
        if let Some(member) = next.members.get_mut(member_idx) {
            member.remaining -= charged;
        }
        next
    }
}

/// Turns a roster into the per-sprint capacity template.
pub struct CapacityModel;

impl CapacityModel {
    pub fn from_members(members: &[TeamMember]) -> SkillCapacity {
        let mut pools: BTreeMap<SkillPool, f64> = BTreeMap::new();
        for member in members {
            let contributions = member.specialty.contributions();
            if contributions.is_empty() {
                tracing::warn!(
                    user_id = %member.user_id,
                    specialty = %member.specialty,
                    "specialty maps to no skill pool; member adds no capacity"
                );
            }
            for (pool, share) in contributions {
                *pools.entry(pool).or_insert(0.0) += member.story_points_per_sprint * share;
            }
        }

        SkillCapacity {
            pools,
            members: members
                .iter()
                .map(|member| MemberCapacity {
                    user_id: member.user_id.clone(),
                    specialty: member.specialty.clone(),
                    total: member.story_points_per_sprint,
                    remaining: member.story_points_per_sprint,
                })
                .collect(),
        }
    }
}

/// One capacity snapshot per sprint slot, indexed by sprint ordinal.
#[derive(Debug, Clone)]
pub struct CapacityArena {
    snapshots: Vec<SkillCapacity>,
}

impl CapacityArena {
    pub fn new(template: &SkillCapacity, sprint_count: usize) -> Self {
        Self {
            snapshots: vec![template.clone(); sprint_count],
        }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn snapshot(&self, ordinal: usize) -> &SkillCapacity {
        &self.snapshots[ordinal]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillCapacity> {
        self.snapshots.iter()
    }

    pub(crate) fn commit(&mut self, ordinal: usize, snapshot: SkillCapacity) {
        self.snapshots[ordinal] = snapshot;
    }
}
