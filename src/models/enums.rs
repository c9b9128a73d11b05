use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Staff roles as issued by the identity service. The string forms are the
// credential labels; anything else fails to parse and therefore carries no
// capabilities.
str_enum!(Role {
    Rn => "RN",
    Lpn => "LPN",
    Pharmacist => "Pharmacist",
    Admin => "Admin",
    Tma => "TMA",
    Cna => "CNA",
    Hha => "HHA",
    Family => "Family",
});

str_enum!(OrderStatus {
    Active => "active",
    Held => "held",
    Discontinued => "discontinued",
    Completed => "completed",
});

str_enum!(AdministrationStatus {
    Pending => "pending",
    Given => "given",
    Refused => "refused",
    Held => "held",
    Omitted => "omitted",
});

impl AdministrationStatus {
    /// Every status except `pending` is terminal: the record never
    /// transitions again once it is reached.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

str_enum!(DrugClass {
    CardiacGlycoside => "cardiac_glycoside",
    Anticoagulant => "anticoagulant",
    Antihypertensive => "antihypertensive",
    Antibiotic => "antibiotic",
    Opioid => "opioid",
    Diuretic => "diuretic",
    Insulin => "insulin",
});

str_enum!(AlertSeverity {
    Minor => "minor",
    Moderate => "moderate",
    Major => "major",
    Critical => "critical",
});

str_enum!(AlertConfidence {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(AlertStatus {
    New => "new",
    Acknowledged => "acknowledged",
    Resolved => "resolved",
});

str_enum!(AcknowledgmentAction {
    Acknowledged => "acknowledged",
    HoldMedication => "hold_medication",
});
