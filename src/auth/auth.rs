use crate::error::LeaveError;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, error::ErrorUnauthorized};
use futures::future::{Ready, ready};

/// Authenticated caller, passed explicitly into every leave operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

impl FromRequest for AuthUser {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    /// Reads the caller stored by `auth_middleware`; routes mounted without
    /// it answer 401.
    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| ErrorUnauthorized("Missing authenticated user")),
        )
    }
}

impl AuthUser {
    pub fn is_approver(&self) -> bool {
        self.role.is_approver()
    }

    /// True when this caller is the employee `employee_id`.
    pub fn owns(&self, employee_id: u64) -> bool {
        self.employee_id == Some(employee_id)
    }

    pub fn require_hr_or_admin(&self) -> Result<(), LeaveError> {
        if self.is_approver() {
            Ok(())
        } else {
            Err(LeaveError::Forbidden("HR/Admin only".into()))
        }
    }

    /// Employees may act on their own leave; HR and admins on anyone's.
    pub fn require_owner_or_approver(&self, employee_id: u64) -> Result<(), LeaveError> {
        if self.is_approver() || self.owns(employee_id) {
            Ok(())
        } else {
            Err(LeaveError::Forbidden("Not allowed to act on another employee's leave".into()))
        }
    }
}
