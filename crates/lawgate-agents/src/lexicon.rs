//! Keyword tables shared by the agents.
//!
//! Every term is matched through [`lawgate_core::TextProbe`]: single words
//! match whole words, phrases match word sequences, and a trailing `*` makes
//! a prefix match.

/// Intent signals. Each distinct hit adds [`COMPLIANCE_WEIGHT`].
pub const COMPLIANCE_KEYWORDS: &[&str] = &[
    "comply",
    "regulation*",
    "law",
    "laws",
    "legal",
    "requirement*",
    "mandatory",
    "protection",
    "privacy",
    "gdpr",
    "coppa",
    "restrict*",
    "prohibit*",
    "enforce*",
    "violat*",
    "penalt*",
    "fine",
    "fines",
    "audit*",
    "regulatory",
    "jurisdiction*",
    "court",
    "litigation",
    "lawsuit*",
    "settlement",
];

pub const BUSINESS_KEYWORDS: &[&str] = &[
    "market*",
    "testing",
    "rollout",
    "launch*",
    "pilot",
    "experiment*",
    "a/b test*",
    "feature flag*",
    "monetiz*",
    "revenue",
    "growth",
    "engagement",
    "retention",
    "conversion*",
    "optimization",
    "performance",
    "user experience",
    "ux",
    "ui",
    "product",
    "strategic",
    "competitive",
];

pub const AMBIGUOUS_KEYWORDS: &[&str] = &[
    "regional",
    "localization",
    "customization",
    "personalization",
    "targeting",
    "segmentation",
    "filtering",
    "recommendation*",
];

pub const COMPLIANCE_WEIGHT: f32 = 0.15;
pub const BUSINESS_WEIGHT: f32 = 0.15;
pub const AMBIGUOUS_WEIGHT: f32 = 0.10;
/// Added to the compliance score per category pattern hit.
pub const CATEGORY_WEIGHT: f32 = 0.10;

/// Compliance categories and the patterns that signal them.
pub const COMPLIANCE_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "age_gate",
        &["age verification", "minor*", "under 18", "parental consent", "coppa", "child*", "teen*"],
    ),
    (
        "data_localization",
        &["data residency", "local storage", "in-country", "jurisdiction", "sovereign*", "regional"],
    ),
    (
        "content_restriction",
        &["block*", "filter*", "restrict access", "geofenc*", "censor*", "moderat*"],
    ),
    (
        "privacy_protection",
        &["pii", "personal data", "gdpr", "privacy", "anonymi*", "pseudonymi*"],
    ),
    (
        "geographic_compliance",
        &["region*", "country", "jurisdiction", "territor*", "border", "cross-border"],
    ),
    (
        "advertising_regulation",
        &["targeted ads", "behavioral advertising", "ad personalization", "marketing"],
    ),
];

/// Abbreviations expanded in place, e.g. `ASL` becomes
/// `ASL (Age/Sex/Location verification system)`.
pub const JARGON: &[(&str, &str)] = &[
    ("ASL", "Age/Sex/Location verification system"),
    ("GH", "Geohashing/Geographic Hashing"),
    ("PF", "Personalized Feed"),
    ("NR", "Network Restrictions"),
    ("KR", "Korea (South Korea)"),
    ("PRD", "Product Requirements Document"),
    ("TRD", "Technical Requirements Document"),
    ("GDPR", "General Data Protection Regulation"),
    ("CCPA", "California Consumer Privacy Act"),
    ("COPPA", "Children's Online Privacy Protection Act"),
    ("DSA", "Digital Services Act"),
    ("SB976", "California Senate Bill 976"),
    ("FTC", "Federal Trade Commission"),
    ("CARU", "Children's Advertising Review Unit"),
    ("FERPA", "Family Educational Rights and Privacy Act"),
    ("FYP", "For You Page"),
    ("UA", "User Acquisition"),
    ("UGC", "User Generated Content"),
    ("RTB", "Real-Time Bidding"),
    ("SDK", "Software Development Kit"),
    ("API", "Application Programming Interface"),
    ("ML", "Machine Learning"),
    ("AI", "Artificial Intelligence"),
    ("KYC", "Know Your Customer"),
    ("2FA", "Two-Factor Authentication"),
    ("SSO", "Single Sign-On"),
    ("CDN", "Content Delivery Network"),
];

/// Regions a feature may be scoped to.
pub const REGIONS: &[(&str, &[&str])] = &[
    ("EU", &["gdpr", "dsa", "european*", "eu", "europe"]),
    ("US", &["coppa", "ccpa", "ftc", "united states", "usa", "america*"]),
    ("APAC", &["asia*", "pacific", "apac", "singapore", "japan*", "australia*"]),
    ("China", &["china", "chinese", "prc", "mainland"]),
    ("India", &["india", "indian", "it rules"]),
    ("Brazil", &["brazil*", "lgpd"]),
    ("Global", &["worldwide", "international", "multi-region", "cross-border"]),
];

/// Named places used for geographic relevance between a feature and a document.
pub const LOCATIONS: &[(&str, &[&str])] = &[
    ("Alabama", &["alabama"]),
    ("Alaska", &["alaska"]),
    ("Arizona", &["arizona"]),
    ("Arkansas", &["arkansas"]),
    ("California", &["california", "ca"]),
    ("Colorado", &["colorado"]),
    ("Connecticut", &["connecticut"]),
    ("Delaware", &["delaware"]),
    ("Florida", &["florida", "fl"]),
    ("Georgia", &["georgia"]),
    ("Hawaii", &["hawaii"]),
    ("Idaho", &["idaho"]),
    ("Illinois", &["illinois"]),
    ("Indiana", &["indiana"]),
    ("Iowa", &["iowa"]),
    ("Kansas", &["kansas"]),
    ("Kentucky", &["kentucky"]),
    ("Louisiana", &["louisiana"]),
    ("Maine", &["maine"]),
    ("Maryland", &["maryland"]),
    ("Massachusetts", &["massachusetts"]),
    ("Michigan", &["michigan"]),
    ("Minnesota", &["minnesota"]),
    ("Mississippi", &["mississippi"]),
    ("Missouri", &["missouri"]),
    ("Montana", &["montana"]),
    ("Nebraska", &["nebraska"]),
    ("Nevada", &["nevada", "nv"]),
    ("New Hampshire", &["new hampshire"]),
    ("New Jersey", &["new jersey"]),
    ("New Mexico", &["new mexico"]),
    ("New York", &["new york", "ny"]),
    ("North Carolina", &["north carolina"]),
    ("North Dakota", &["north dakota"]),
    ("Ohio", &["ohio"]),
    ("Oklahoma", &["oklahoma"]),
    ("Oregon", &["oregon"]),
    ("Pennsylvania", &["pennsylvania"]),
    ("Rhode Island", &["rhode island"]),
    ("South Carolina", &["south carolina"]),
    ("South Dakota", &["south dakota"]),
    ("Tennessee", &["tennessee"]),
    ("Texas", &["texas", "tx"]),
    ("Utah", &["utah", "ut"]),
    ("Vermont", &["vermont"]),
    ("Virginia", &["virginia"]),
    ("Washington", &["washington"]),
    ("West Virginia", &["west virginia"]),
    ("Wisconsin", &["wisconsin"]),
    ("Wyoming", &["wyoming"]),
    ("European Union", &["european union", "eu"]),
    ("United Kingdom", &["united kingdom", "uk"]),
];

/// Compliance topics compared between a feature and a document.
pub const TOPICS: &[(&str, &[&str])] = &[
    (
        "minors",
        &[
            "minor", "minors", "underage", "teen*", "under 13", "under 14", "under 16", "under 18",
            "users under", "children under", "younger than",
        ],
    ),
    ("children", &["child", "children", "kids"]),
    ("age verification", &["age verif*", "verify age", "age check*", "age gate*", "age assurance"]),
    ("social media", &["social media", "social network*"]),
    ("privacy", &["privacy"]),
    ("data protection", &["data protection", "personal data", "personal information", "pii"]),
    ("parental consent", &["parental consent", "parent approval", "parental approval", "guardian approval"]),
    ("coppa", &["coppa"]),
    ("curfew", &["curfew", "time restrict*", "hours limit*"]),
    ("addiction", &["addict*", "compulsive"]),
    ("content moderation", &["content moderation", "content filter*", "block content", "blocking content"]),
    ("algorithmic transparency", &["algorithmic transparency", "recommendation algorithm*"]),
    ("targeted advertising", &["targeted ad*", "behavioral advertising", "ad personali*"]),
    (
        "data collection",
        &["data collect*", "collect data", "collecting data", "collecting personal", "user data"],
    ),
];

/// Regulations recognised by name. Order decides which name wins when a
/// document mentions several.
pub const REGULATIONS: &[(&str, &[&str])] = &[
    ("COPPA", &["coppa", "children s online privacy protection"]),
    ("GDPR", &["gdpr", "general data protection regulation"]),
    ("CCPA", &["ccpa", "california consumer privacy act"]),
    ("CPRA", &["cpra", "california privacy rights act"]),
    ("SB 976", &["sb 976", "sb976"]),
    ("DSA", &["dsa", "digital services act"]),
    ("DMA", &["dma", "digital markets act"]),
    ("FERPA", &["ferpa"]),
    ("LGPD", &["lgpd"]),
];

/// Generic legislative references that count as an explicit regulation
/// mention but never name one.
pub const LEGISLATION_MENTIONS: &[&str] = &["house bill", "senate bill"];

pub const HIGH_RISK_TERMS: &[&str] = &[
    "penalt*",
    "fine",
    "fines",
    "criminal",
    "violat*",
    "lawsuit*",
    "prohibit*",
    "illegal",
];

pub const MEDIUM_RISK_TERMS: &[&str] = &[
    "require*",
    "mandatory",
    "must",
    "shall",
    "obligat*",
    "duty",
];

/// Phrases after which a document states an obligation.
pub const REQUIREMENT_MARKERS: &[&str] = &[
    "must",
    "shall",
    "required to",
    "prohibited from",
    "mandatory",
];

/// Jurisdiction hints for documents that carry no jurisdiction field.
pub const JURISDICTIONS: &[(&str, &[&str])] = &[
    ("EU", &["european", "eu", "gdpr", "europe"]),
    ("California", &["california", "ccpa", "sb976", "sb 976"]),
    ("US", &["united states", "america", "federal", "coppa"]),
    ("Global", &["international", "worldwide", "cross-border"]),
];

pub const COMPLEXITY_HIGH: &[&str] = &[
    "machine learning",
    "ai",
    "algorithm*",
    "real-time",
    "distributed",
    "microservice*",
    "blockchain",
    "encrypt*",
    "authenticat*",
];

pub const COMPLEXITY_MEDIUM: &[&str] = &[
    "api",
    "apis",
    "database*",
    "integrat*",
    "middleware",
    "cache",
    "caching",
    "load balanc*",
    "monitoring",
    "logging",
];

pub const COMPLEXITY_LOW: &[&str] = &[
    "configuration",
    "config",
    "toggle",
    "flag",
    "flags",
    "setting",
    "settings",
    "parameter*",
];

pub const INTEGRATIONS: &[(&str, &[&str])] = &[
    ("user_service", &["user*", "account*", "profile*", "authenticat*"]),
    ("location_service", &["location*", "geo*", "region*", "country", "countries"]),
    ("content_service", &["content", "feed*", "recommendation*"]),
    ("analytics_service", &["analytics", "tracking", "metric*"]),
    ("notification_service", &["notification*", "alert*", "message*"]),
    ("payment_service", &["payment*", "billing", "subscription*"]),
];

pub const DATA_FLOWS: &[(&str, &[&str])] = &[
    ("user_data_collection", &["collect*", "gather*", "capture*", "input*"]),
    ("data_processing", &["process*", "analy*", "compute*", "calculat*"]),
    ("data_storage", &["store", "stores", "stored", "storing", "storage", "save*", "persist*", "database*"]),
    ("data_transmission", &["send*", "transmit*", "sync*", "share", "shared", "sharing"]),
    ("data_validation", &["validat*", "verif*", "check*", "confirm*"]),
];

pub const SECURITY: &[(&str, &[&str])] = &[
    ("authentication", &["login*", "log in", "auth*", "credential*", "verif*"]),
    ("authorization", &["permission*", "access*", "role*", "privilege*"]),
    ("encryption", &["encrypt*", "secur*", "protect*", "privacy"]),
    ("audit_logging", &["log", "logs", "logging", "audit*", "track*", "monitor*"]),
    ("data_protection", &["protection", "security", "safe*", "compliance"]),
];

/// Strip the prefix marker for display.
pub fn label(term: &str) -> &str {
    term.trim_end_matches('*')
}
