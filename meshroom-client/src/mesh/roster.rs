use meshroom_core::{ParticipantId, ParticipantRecord};

/// Remote participants currently present, kept in join order.
///
/// Mutated only by the room event loop.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    members: Vec<ParticipantRecord>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the participant was already known.
    pub fn add(&mut self, record: ParticipantRecord) -> bool {
        if self.contains(&record.participant_id) {
            return false;
        }
        let at = self
            .members
            .partition_point(|m| m.join_order <= record.join_order);
        self.members.insert(at, record);
        true
    }

    pub fn remove(&mut self, id: &ParticipantId) -> Option<ParticipantRecord> {
        let at = self.members.iter().position(|m| &m.participant_id == id)?;
        Some(self.members.remove(at))
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.get(id).is_some()
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&ParticipantRecord> {
        self.members.iter().find(|m| &m.participant_id == id)
    }

    pub fn members(&self) -> &[ParticipantRecord] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }
}
