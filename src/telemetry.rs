use metrics::describe_counter;
use once_cell::sync::OnceCell;

pub const FEED_ERRORS: &str = "notifier_feed_errors_total";
pub const ITEMS_NEW: &str = "notifier_items_new_total";
pub const DELIVERED: &str = "notifier_delivered_total";
pub const EXHAUSTED: &str = "notifier_exhausted_total";
pub const STORE_ERRORS: &str = "notifier_store_errors_total";

/// One-time metrics registration so the series carry descriptions once a
/// recorder is installed.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(FEED_ERRORS, "Feed fetch/parse failures.");
        describe_counter!(ITEMS_NEW, "Items that passed the dedup check.");
        describe_counter!(DELIVERED, "Notifications delivered to the chat backend.");
        describe_counter!(
            EXHAUSTED,
            "Notifications dropped after retries were exhausted."
        );
        describe_counter!(STORE_ERRORS, "Seen-store lookup/insert failures.");
    });
}
