#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Role {
    Superadmin = 1,
    Admin = 2,
    Hr = 3,
    Employee = 4,
    Client = 5,
}

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Superadmin),
            2 => Some(Role::Admin),
            3 => Some(Role::Hr),
            4 => Some(Role::Employee),
            5 => Some(Role::Client),
            _ => None,
        }
    }
}
