pub struct Icons;

impl Icons {
    pub const LINK: &str = "🔗";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const STATS: &str = "📊";
    pub const SEARCH: &str = "🔍";
    pub const DATABASE: &str = "🗄️";
    pub const NEW: &str = "✨";
    pub const DEL: &str = "🗑️";
    pub const TAG: &str = "🏷️";
    pub const GEAR: &str = "⚙️";
    pub const EMPTY: &str = "∅";
}
