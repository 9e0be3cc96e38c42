pub mod links {
    /// Name of the synthetic link derived from a shell's global asset id.
    pub const GLOBAL_ASSET_ID: &str = "globalAssetId";
}

pub mod defaults {
    pub const SERVICE_NAME: &str = "aas-discovery";

    /// Page size used by the lookup API when the request carries no `limit`.
    pub const PAGE_LIMIT: usize = 100;
}

pub mod profiles {
    pub const DISCOVERY_SERVICE: &str =
        "https://admin-shell.io/aas/API/3/0/DiscoveryServiceSpecification/SSP-001";
}

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const DESCRIPTION: &str = "/description";

    pub const SHELLS: &str = "/lookup/shells";
    pub const SHELLS_BY_ID: &str = "/lookup/shells/{aas_identifier}";

    pub const DOCUMENTS: &str = "/lookup/documents";
    pub const EVENTS: &str = "/lookup/events";
}
