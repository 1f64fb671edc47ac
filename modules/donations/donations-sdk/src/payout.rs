//! Typed payout references.
//!
//! Storage keeps `(to_type, to_id)` and `(source_type, source_id)` columns; these
//! enums are the only way the rest of the code sees them.

use uuid::Uuid;

use crate::status::UnknownVariant;

/// Who a payout is owed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutTarget {
    Vendor(Uuid),
    /// The NGO itself, identified by its tenant id.
    Ngo(Uuid),
}

impl PayoutTarget {
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::Vendor(_) => "VENDOR",
            Self::Ngo(_) => "NGO",
        }
    }

    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::Vendor(id) | Self::Ngo(id) => id,
        }
    }

    /// Rebuild from stored columns.
    ///
    /// # Errors
    /// [`UnknownVariant`] if `kind` is neither `VENDOR` nor `NGO`.
    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self, UnknownVariant> {
        match kind {
            "VENDOR" => Ok(Self::Vendor(id)),
            "NGO" => Ok(Self::Ngo(id)),
            other => Err(UnknownVariant {
                kind: "PayoutTarget",
                value: other.to_owned(),
            }),
        }
    }
}

/// The approval event a payout was created by. At most one payout exists per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayoutSource {
    VendorInvoice(Uuid),
    NgoReceipt(Uuid),
}

impl PayoutSource {
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::VendorInvoice(_) => "VENDOR_INVOICE",
            Self::NgoReceipt(_) => "NGO_RECEIPT",
        }
    }

    #[must_use]
    pub const fn id(self) -> Uuid {
        match self {
            Self::VendorInvoice(id) | Self::NgoReceipt(id) => id,
        }
    }

    /// # Errors
    /// [`UnknownVariant`] for an unrecognised `kind`.
    pub fn from_parts(kind: &str, id: Uuid) -> Result<Self, UnknownVariant> {
        match kind {
            "VENDOR_INVOICE" => Ok(Self::VendorInvoice(id)),
            "NGO_RECEIPT" => Ok(Self::NgoReceipt(id)),
            other => Err(UnknownVariant {
                kind: "PayoutSource",
                value: other.to_owned(),
            }),
        }
    }
}
