use super::status::RepoStatus;

/// Identifies one launched resolution so its completion can be matched
/// against the launch that is still current for that repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(pub u64);

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Events delivered to the dashboard's control loop
#[derive(Debug, Clone)]
pub enum Event {
    /// A background resolution finished (successfully or not)
    StatusResolved { ticket: Ticket, status: RepoStatus },

    /// The periodic auto refresh timer fired
    AutoRefreshDue,
}
