pub mod droid;
pub mod feed;
pub mod login;
pub mod matcher;
pub mod outreach;
pub mod pipeline;
pub mod probe;
pub mod search;

pub use droid::*;
pub use probe::*;
pub use feed::*;
pub use login::*;
pub use matcher::*;
pub use outreach::*;
pub use pipeline::*;
pub use search::*;
