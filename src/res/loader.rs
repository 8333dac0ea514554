use crate::errors::Result;

use super::scope::Scope;
use super::service::ServiceShared;

/// A parser that turns raw bytes into a populated resource. Loaders are registered by
/// file extension and invoked on loader threads.
///
/// ```rust,ignore
/// impl Loader for TextLoader {
///     fn extensions(&self) -> &[&str] {
///         &["txt"]
///     }
///
///     fn load(&self, _: &ServiceShared, scope: &mut Scope, bytes: &[u8]) -> Result<()> {
///         let text = scope
///             .target_as::<Text>()
///             .ok_or_else(|| format_err!("{} is not a text resource.", scope.key()))?;
///         text.write().0 = String::from_utf8(bytes.to_vec())?;
///         Ok(())
///     }
/// }
/// ```
pub trait Loader: Send + Sync + 'static {
    /// Lower-case extensions without the leading dot, e.g. `"png"`.
    fn extensions(&self) -> &[&str];

    /// Populates the target resource of `scope` from `bytes`. Child resources requested
    /// through `service.load` must pass `Some(scope)` so the target waits for them.
    ///
    /// Returning an error fails the resource.
    fn load(&self, service: &ServiceShared, scope: &mut Scope, bytes: &[u8]) -> Result<()>;
}
