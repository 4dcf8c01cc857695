use crate::model::role::Role;

/// Caller identity as resolved by the HTTP layer: the account id, the
/// employee record the account is linked to (absent for pure back-office
/// accounts) and the account's role. Ownership of a request is an
/// employee-id question; review stamps record the account id.
#[derive(Debug, Copy, Clone)]
pub struct Caller {
    pub user_id: u64,
    pub employee_id: Option<u64>,
    pub role: Role,
}

impl Caller {
    pub fn owns(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }
}

/// Mutating action on an existing leave request. Editing is not listed
/// here: edits are owner-only and gated by ownership and record state, not
/// by role.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LeaveAction {
    Approve,
    Reject,
    Cancel,
    Delete,
}

impl LeaveAction {
    pub fn verb(&self) -> &'static str {
        match self {
            LeaveAction::Approve => "approve",
            LeaveAction::Reject => "reject",
            LeaveAction::Cancel => "cancel",
            LeaveAction::Delete => "delete",
        }
    }
}

/// Roles that review leave on behalf of the organisation.
pub fn is_reviewer(role: Role) -> bool {
    matches!(role, Role::Superadmin | Role::Admin | Role::Hr)
}

/// The role side of the permission matrix: what a caller may do to someone
/// else's request purely by virtue of their role.
fn role_permits(role: Role, action: LeaveAction) -> bool {
    match role {
        Role::Superadmin | Role::Admin | Role::Hr => match action {
            LeaveAction::Approve | LeaveAction::Reject | LeaveAction::Cancel | LeaveAction::Delete => true,
        },
        Role::Employee | Role::Client => false,
    }
}

/// The ownership side of the matrix: what the requester may do to their own
/// request regardless of role. State checks (pending-only rules) come after.
fn owner_permits(action: LeaveAction) -> bool {
    match action {
        LeaveAction::Cancel | LeaveAction::Delete => true,
        LeaveAction::Approve | LeaveAction::Reject => false,
    }
}

/// Single entry point for the permission matrix, evaluated once per
/// transition before any state rule.
pub fn permits(role: Role, is_owner: bool, action: LeaveAction) -> bool {
    role_permits(role, action) || (is_owner && owner_permits(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reviewer_roles_may_approve_and_reject() {
        for role in [Role::Superadmin, Role::Admin, Role::Hr] {
            assert!(permits(role, false, LeaveAction::Approve));
            assert!(permits(role, false, LeaveAction::Reject));
        }
    }

    #[test]
    fn employee_cannot_review_even_their_own_request() {
        assert!(!permits(Role::Employee, true, LeaveAction::Approve));
        assert!(!permits(Role::Employee, true, LeaveAction::Reject));
    }

    #[test]
    fn owner_may_cancel_and_delete() {
        assert!(permits(Role::Employee, true, LeaveAction::Cancel));
        assert!(permits(Role::Employee, true, LeaveAction::Delete));
        assert!(permits(Role::Client, true, LeaveAction::Cancel));
    }

    #[test]
    fn stranger_with_plain_role_gets_nothing() {
        for action in [
            LeaveAction::Approve,
            LeaveAction::Reject,
            LeaveAction::Cancel,
            LeaveAction::Delete,
        ] {
            assert!(!permits(Role::Employee, false, action));
            assert!(!permits(Role::Client, false, action));
        }
    }

    #[test]
    fn reviewers_are_exactly_the_three_admin_roles() {
        assert!(is_reviewer(Role::Superadmin));
        assert!(is_reviewer(Role::Admin));
        assert!(is_reviewer(Role::Hr));
        assert!(!is_reviewer(Role::Employee));
        assert!(!is_reviewer(Role::Client));
    }
}
