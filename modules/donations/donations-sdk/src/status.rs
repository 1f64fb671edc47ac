//! Lifecycle enums. Each one is stored as its SCREAMING_SNAKE_CASE name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A stored enum value that does not name any variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! stored_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.as_str() == s)
                    .ok_or_else(|| UnknownVariant {
                        kind: stringify!($name),
                        value: s.to_owned(),
                    })
            }
        }
    };
}

stored_enum!(
    /// Verification state of a custom tenant domain.
    DomainStatus {
        PendingDns => "PENDING_DNS",
        Live => "LIVE",
        Disabled => "DISABLED",
    }
);

stored_enum!(
    CauseType {
        Vendor => "VENDOR",
        NgoManaged => "NGO_MANAGED",
    }
);

stored_enum!(
    CauseStatus {
        Draft => "DRAFT",
        Live => "LIVE",
        Funded => "FUNDED",
        Fulfilled => "FULFILLED",
        Closed => "CLOSED",
    }
);

impl CauseStatus {
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Live | Self::Closed)
                | (Self::Live, Self::Funded | Self::Closed)
                | (Self::Funded, Self::Fulfilled | Self::Closed)
                | (Self::Fulfilled, Self::Closed)
        )
    }

    /// Only live causes accept donations.
    #[must_use]
    pub fn accepts_donations(self) -> bool {
        self == Self::Live
    }
}

stored_enum!(
    /// `REFUNDED` exists for stored data; no operation moves a donation into it.
    DonationStatus {
        Init => "INIT",
        Captured => "CAPTURED",
        Refunded => "REFUNDED",
        Failed => "FAILED",
    }
);

stored_enum!(
    InvoiceStatus {
        Submitted => "SUBMITTED",
        NgoApproved => "NGO_APPROVED",
        Paid => "PAID",
        Rejected => "REJECTED",
    }
);

stored_enum!(
    ReceiptStatus {
        Submitted => "SUBMITTED",
        AdminApproved => "ADMIN_APPROVED",
        Paid => "PAID",
        Rejected => "REJECTED",
    }
);

stored_enum!(
    PayoutStatus {
        Init => "INIT",
        Queued => "QUEUED",
        Processed => "PROCESSED",
        Failed => "FAILED",
    }
);

impl PayoutStatus {
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Queued | Self::Failed) | (Self::Queued, Self::Processed | Self::Failed)
        )
    }
}

stored_enum!(
    KycStatus {
        Pending => "PENDING",
        Verified => "VERIFIED",
        Rejected => "REJECTED",
    }
);

stored_enum!(
    DocumentPurpose {
        VendorInvoice => "VENDOR_INVOICE",
        NgoReceipt => "NGO_RECEIPT",
    }
);
