//! File-system routing
//!
//! The compiled `pages/` directory is the route table:
//!
//! | File                     | Pattern          |
//! |--------------------------|------------------|
//! | `pages/index.js`         | `/`              |
//! | `pages/counter.js`       | `/counter`       |
//! | `pages/security/index.js`| `/security`      |
//! | `pages/posts/+postId.js` | `/posts/:postId` |
//!
//! Static patterns always take precedence over dynamic ones.

mod discovery;
mod pattern;
mod table;

pub use discovery::RouteTableBuilder;
pub use pattern::{PAGE_EXTENSIONS, PagePath, Segment, is_page_file, page_path};
pub use table::{RouteDescriptor, RouteMatch, RouteTable, request_segments};
