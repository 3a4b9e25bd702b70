//! Group matcher: 16 control bytes in, 16-bit slot mask out.

mod bitmask;
#[cfg_attr(
    all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
        not(miri)
    ),
    allow(dead_code)
)]
pub(crate) mod generic;

pub use bitmask::BitMask;

cfg_if::cfg_if! {
    if #[cfg(all(
        target_feature = "sse2",
        any(target_arch = "x86", target_arch = "x86_64"),
        not(miri)
    ))] {
        pub(crate) mod sse2;
        pub use sse2::Group;
    } else {
        pub use generic::Group;
    }
}
