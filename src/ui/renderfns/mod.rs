mod footer;
mod header;
mod utils;

pub use footer::draw_footer;
pub use header::draw_header;
pub use utils::{expiry_color, format_price, truncate};
