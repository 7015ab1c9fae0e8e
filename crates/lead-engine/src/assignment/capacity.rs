use std::sync::Mutex;

use super::domain::{CapacityEnforcement, TeamMemberCapacity};

/// Capacity administration failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CapacityError {
    #[error("team member '{0}' is not tracked")]
    UnknownMember(String),
}

/// Owns per-member load counters and availability flags. The single mutex
/// makes the check-then-increment sequence in [`CapacityTracker::try_assign`]
/// atomic, so two concurrent assignments cannot both observe spare capacity
/// and push a member past `max_leads`.
///
/// Members are kept in insertion order; round-robin rotation and load-ratio
/// tie-breaking both depend on that order staying stable.
#[derive(Debug, Default)]
pub struct CapacityTracker {
    members: Mutex<Vec<TeamMemberCapacity>>,
}

impl CapacityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or replaces a member's capacity entry. Last write wins.
    pub fn set_capacity(&self, capacity: TeamMemberCapacity) {
        let mut members = self.members.lock().expect("capacity lock poisoned");
        match members
            .iter_mut()
            .find(|member| member.user_id == capacity.user_id)
        {
            Some(existing) => *existing = capacity,
            None => members.push(capacity),
        }
    }

    pub fn update_current_leads(
        &self,
        user_id: &str,
        current_leads: u32,
    ) -> Result<(), CapacityError> {
        let mut members = self.members.lock().expect("capacity lock poisoned");
        let member = members
            .iter_mut()
            .find(|member| member.user_id == user_id)
            .ok_or_else(|| CapacityError::UnknownMember(user_id.to_string()))?;
        member.current_leads = current_leads;
        Ok(())
    }

    pub fn set_availability(&self, user_id: &str, availability: bool) -> Result<(), CapacityError> {
        let mut members = self.members.lock().expect("capacity lock poisoned");
        let member = members
            .iter_mut()
            .find(|member| member.user_id == user_id)
            .ok_or_else(|| CapacityError::UnknownMember(user_id.to_string()))?;
        member.availability = availability;
        Ok(())
    }

    /// Every tracked member, in insertion order.
    pub fn members(&self) -> Vec<TeamMemberCapacity> {
        self.members.lock().expect("capacity lock poisoned").clone()
    }

    /// Members currently accepting work, capacity ignored.
    pub fn available_members(&self) -> Vec<TeamMemberCapacity> {
        self.members
            .lock()
            .expect("capacity lock poisoned")
            .iter()
            .filter(|member| member.availability)
            .cloned()
            .collect()
    }

    /// Members that are available and under their lead ceiling.
    pub fn members_with_spare_capacity(&self) -> Vec<TeamMemberCapacity> {
        self.members
            .lock()
            .expect("capacity lock poisoned")
            .iter()
            .filter(|member| member.availability && member.has_spare_capacity())
            .cloned()
            .collect()
    }

    /// Whether `user_id` may receive an assignment under the given
    /// enforcement mode. Unknown members always fail.
    pub fn validate(&self, user_id: &str, enforcement: CapacityEnforcement) -> bool {
        let members = self.members.lock().expect("capacity lock poisoned");
        let Some(member) = members.iter().find(|member| member.user_id == user_id) else {
            return false;
        };
        match enforcement {
            CapacityEnforcement::Strict => member.availability && member.has_spare_capacity(),
            CapacityEnforcement::AvailabilityOnly => member.availability,
        }
    }

    /// Atomically re-checks spare capacity and increments the member's count.
    /// Returns false without mutating when the member is gone, unavailable,
    /// or already at capacity.
    pub fn try_assign(&self, user_id: &str) -> bool {
        let mut members = self.members.lock().expect("capacity lock poisoned");
        let Some(member) = members.iter_mut().find(|member| member.user_id == user_id) else {
            return false;
        };
        if !member.availability || !member.has_spare_capacity() {
            return false;
        }
        member.current_leads += 1;
        true
    }
}
