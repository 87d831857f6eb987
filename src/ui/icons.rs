pub struct Icons;

impl Icons {
    pub const TROPHY: &str = "🏆";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const DATABASE: &str = "🗄️";
    pub const GLOBE: &str = "🌍";
    pub const EMPTY: &str = "∅";
}
