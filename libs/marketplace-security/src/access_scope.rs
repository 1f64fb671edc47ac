use uuid::Uuid;

/// Ownership coordinates of a resource being accessed.
///
/// `vendor_id` and `donor_id` are set only for resources that reference a
/// vendor or a donor; a grant bound to a vendor (or donor) is checked against
/// them only when present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub donor_id: Option<Uuid>,
}

impl ResourceRef {
    #[must_use]
    pub const fn tenant(tenant_id: Uuid) -> Self {
        Self {
            tenant_id,
            vendor_id: None,
            donor_id: None,
        }
    }

    #[must_use]
    pub const fn with_vendor(mut self, vendor_id: Uuid) -> Self {
        self.vendor_id = Some(vendor_id);
        self
    }

    #[must_use]
    pub const fn with_donor(mut self, donor_id: Uuid) -> Self {
        self.donor_id = Some(donor_id);
        self
    }
}

/// One grant's worth of visibility: rows of `tenant_id`, optionally narrowed
/// to a vendor or a donor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScopeClause {
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
    pub donor_id: Option<Uuid>,
}

impl ScopeClause {
    fn matches(&self, resource: &ResourceRef) -> bool {
        fn bound(clause: Option<Uuid>, resource: Option<Uuid>) -> bool {
            match (clause, resource) {
                (Some(want), Some(have)) => want == have,
                _ => true,
            }
        }
        self.tenant_id == resource.tenant_id
            && bound(self.vendor_id, resource.vendor_id)
            && bound(self.donor_id, resource.donor_id)
    }
}

/// Visibility of a caller over one kind of resource.
///
/// A scope is the OR of its clauses. An empty, restricted scope denies all.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccessScope {
    unrestricted: bool,
    clauses: Vec<ScopeClause>,
}

impl AccessScope {
    #[must_use]
    pub fn unrestricted() -> Self {
        Self {
            unrestricted: true,
            clauses: Vec::new(),
        }
    }

    #[must_use]
    pub fn deny_all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_clauses(clauses: Vec<ScopeClause>) -> Self {
        Self {
            unrestricted: false,
            clauses,
        }
    }

    #[must_use]
    pub fn is_unrestricted(&self) -> bool {
        self.unrestricted
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.unrestricted && self.clauses.is_empty()
    }

    #[must_use]
    pub fn clauses(&self) -> &[ScopeClause] {
        &self.clauses
    }

    /// Tenants reachable through at least one clause.
    #[must_use]
    pub fn tenant_ids(&self) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = self.clauses.iter().map(|c| c.tenant_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    #[must_use]
    pub fn permits(&self, resource: &ResourceRef) -> bool {
        self.unrestricted || self.clauses.iter().any(|c| c.matches(resource))
    }
}
