use wall_kernel::{Kernel, KernelIntrospect};

/// Kernel access for code that both builds solids and queries them.
///
/// Lets a single `&mut dyn KernelBundle` be handed around instead of a
/// mutable and a shared borrow of the same kernel.
pub trait KernelBundle: Kernel + KernelIntrospect {
    /// The query half of the bundle, for APIs that take `&dyn KernelIntrospect`.
    fn as_introspect(&self) -> &dyn KernelIntrospect;
}

impl<T: Kernel + KernelIntrospect> KernelBundle for T {
    fn as_introspect(&self) -> &dyn KernelIntrospect {
        self
    }
}
