//! Role → capability matrix.
//!
//! Default-deny: capabilities exist only for roles the matrix names, and a
//! role label that does not parse carries no capabilities at all. Identity
//! is always passed in explicitly — there is no ambient session state here.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::enums::Role;

/// What a role may do inside the medication workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    /// Administer medications on the role's own license.
    Administer,
    /// Administer under delegation and supervision; excludes order management.
    AdministerDelegated,
    /// Hold, resume, discontinue, or edit medication orders.
    ManageOrders,
    ViewClinical,
    EditPatient,
    /// Acknowledge ADR alerts. Whoever gives doses must be able to
    /// acknowledge risk for them, so this tracks the administer set.
    AcknowledgeAdr,
    /// Report a clinical concern up the chain.
    ReportConcern,
    /// Request a medication reorder from the pharmacy.
    RequestReorder,
}

/// Roles that administer on their own license.
const LICENSED_ADMINISTER: [Role; 3] = [Role::Rn, Role::Lpn, Role::Admin];

/// Roles that administer under delegation.
const DELEGATED_ADMINISTER: [Role; 1] = [Role::Tma];

/// The full capability set for a role, exhaustive over the closed role enum.
pub fn capabilities_of(role: Role) -> &'static [Capability] {
    use Capability::*;
    match role {
        Role::Rn | Role::Lpn => &[
            Administer,
            ManageOrders,
            ViewClinical,
            EditPatient,
            AcknowledgeAdr,
            ReportConcern,
            RequestReorder,
        ],
        Role::Admin => &[Administer, ManageOrders, ViewClinical, EditPatient, AcknowledgeAdr],
        Role::Pharmacist => &[ManageOrders, ViewClinical],
        Role::Tma => &[
            AdministerDelegated,
            ViewClinical,
            AcknowledgeAdr,
            ReportConcern,
            RequestReorder,
        ],
        Role::Cna | Role::Hha => &[ViewClinical, ReportConcern, RequestReorder],
        Role::Family => &[ViewClinical],
    }
}

/// Capabilities for a raw role label as supplied by the identity service.
/// Unknown or absent labels get the empty set.
pub fn capabilities_for_label(label: &str) -> &'static [Capability] {
    match Role::from_str(label) {
        Ok(role) => capabilities_of(role),
        Err(_) => &[],
    }
}

pub fn has_capability(role: Role, capability: Capability) -> bool {
    capabilities_of(role).contains(&capability)
}

/// Licensed to administer on the role's own authority.
pub fn is_licensed(role: Role) -> bool {
    LICENSED_ADMINISTER.contains(&role)
}

/// Administers under delegation; barred from order management.
pub fn is_delegated(role: Role) -> bool {
    DELEGATED_ADMINISTER.contains(&role)
}

/// The combined administer set: licensed plus delegated roles.
pub fn can_administer(role: Role) -> bool {
    is_licensed(role) || is_delegated(role)
}

pub fn can_manage_orders(role: Role) -> bool {
    has_capability(role, Capability::ManageOrders)
}

/// Equals the combined administer set.
pub fn can_acknowledge_adr(role: Role) -> bool {
    has_capability(role, Capability::AcknowledgeAdr)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [Role; 8] = [
        Role::Rn,
        Role::Lpn,
        Role::Pharmacist,
        Role::Admin,
        Role::Tma,
        Role::Cna,
        Role::Hha,
        Role::Family,
    ];

    #[test]
    fn administer_set_is_exactly_rn_lpn_admin_tma() {
        for role in ALL_ROLES {
            let expected = matches!(role, Role::Rn | Role::Lpn | Role::Admin | Role::Tma);
            assert_eq!(can_administer(role), expected, "administer for {role:?}");
        }
    }

    #[test]
    fn manage_orders_set_is_exactly_rn_lpn_pharmacist_admin() {
        for role in ALL_ROLES {
            let expected = matches!(
                role,
                Role::Rn | Role::Lpn | Role::Pharmacist | Role::Admin
            );
            assert_eq!(can_manage_orders(role), expected, "manage orders for {role:?}");
        }
    }

    #[test]
    fn licensed_and_delegated_are_disjoint() {
        for role in ALL_ROLES {
            assert!(
                !(is_licensed(role) && is_delegated(role)),
                "{role:?} is both licensed and delegated"
            );
        }
    }

    #[test]
    fn delegated_roles_never_manage_orders() {
        for role in ALL_ROLES.into_iter().filter(|r| is_delegated(*r)) {
            assert!(!can_manage_orders(role));
        }
    }

    #[test]
    fn acknowledge_adr_tracks_administer_set() {
        for role in ALL_ROLES {
            assert_eq!(
                can_acknowledge_adr(role),
                can_administer(role),
                "acknowledge vs administer for {role:?}"
            );
        }
    }

    #[test]
    fn support_roles_view_but_never_administer() {
        for role in [Role::Cna, Role::Hha] {
            assert!(has_capability(role, Capability::ViewClinical));
            assert!(has_capability(role, Capability::ReportConcern));
            assert!(has_capability(role, Capability::RequestReorder));
            assert!(!can_administer(role));
            assert!(!has_capability(role, Capability::Administer));
            assert!(!has_capability(role, Capability::AdministerDelegated));
        }
    }

    #[test]
    fn unknown_label_gets_empty_set() {
        assert!(capabilities_for_label("Physician").is_empty());
        assert!(capabilities_for_label("").is_empty());
        assert!(capabilities_for_label("rn").is_empty()); // labels are case-sensitive
    }

    #[test]
    fn known_label_resolves() {
        assert!(capabilities_for_label("TMA").contains(&Capability::AdministerDelegated));
        assert!(capabilities_for_label("RN").contains(&Capability::Administer));
    }
}
