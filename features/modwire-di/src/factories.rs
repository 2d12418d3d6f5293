use std::{future::Future, sync::Arc};

use futures::{future::BoxFuture, FutureExt};

use crate::{
    props::ModuleProps,
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// Shared, type erased module builder
pub type BoxedFactory = Arc<dyn DynModuleFactory>;

/// A Factory constructing the instance of a module
pub trait ModuleFactory: Send + Sync {
    type Provides: Injectable;
    type Error: Into<DynError>;

    /// Returns the typeinfo about the factory's provided type
    fn supplies() -> TypeInfo {
        TypeInfo::of::<Self::Provides>()
    }

    /// Constructs the module from its arguments and resolved dependencies
    fn construct(
        &self,
        props: ModuleProps,
    ) -> impl Future<Output = Result<Self::Provides, Self::Error>> + Send + '_;
}

/// Wrapper Trait for factories, providing instances of Any
pub trait DynModuleFactory: Send + Sync {
    fn supplies(&self) -> TypeInfo;

    fn construct(&self, props: ModuleProps) -> BoxFuture<'_, Result<Instance, DynError>>;
}
// Impl DynModuleFactory for any ModuleFactory
impl<T: Injectable, SpecificFactory: ModuleFactory<Provides = T>> DynModuleFactory
    for SpecificFactory
{
    fn supplies(&self) -> TypeInfo {
        <SpecificFactory as ModuleFactory>::supplies()
    }

    fn construct(&self, props: ModuleProps) -> BoxFuture<'_, Result<Instance, DynError>> {
        async move {
            // Forward the call to the specific implementation
            ModuleFactory::construct(self, props)
                .await
                .map(Instance::new)
                .map_err(Into::into)
        }
        .boxed()
    }
}

/// Factory calling an async function
pub struct FnFactory<F>(F);
impl<F> FnFactory<F> {
    pub fn new(builder: F) -> Self {
        Self(builder)
    }
}
impl<F, Fut, T, E> ModuleFactory for FnFactory<F>
where
    F: Fn(ModuleProps) -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, E>> + Send + 'static,
    T: Injectable,
    E: Into<DynError> + 'static,
{
    type Provides = T;
    type Error = E;

    fn construct(&self, props: ModuleProps) -> impl Future<Output = Result<T, E>> + Send + '_ {
        (self.0)(props)
    }
}

/// Factory calling a synchronous function, e.g. a constructor
pub struct SyncFactory<F>(F);
impl<F> SyncFactory<F> {
    pub fn new(builder: F) -> Self {
        Self(builder)
    }
}
impl<F, T, E> ModuleFactory for SyncFactory<F>
where
    F: Fn(ModuleProps) -> Result<T, E> + Send + Sync,
    T: Injectable,
    E: Into<DynError> + Send + 'static,
{
    type Provides = T;
    type Error = E;

    fn construct(&self, props: ModuleProps) -> impl Future<Output = Result<T, E>> + Send + '_ {
        futures::future::ready((self.0)(props))
    }
}

#[cfg(test)]
mod tests {
    use std::{convert::Infallible, fmt};

    use futures::executor::block_on;

    use super::*;
    use crate::props::Dependencies;

    #[derive(Debug)]
    struct Greeter {
        greeting: String,
    }

    struct GreeterFactory;
    impl ModuleFactory for GreeterFactory {
        type Provides = Greeter;
        type Error = Infallible;

        async fn construct(&self, props: ModuleProps) -> Result<Greeter, Infallible> {
            Ok(Greeter {
                greeting: format!("hello from {}", props.module()),
            })
        }
    }

    #[derive(Debug)]
    struct Refused;
    impl fmt::Display for Refused {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("refused")
        }
    }
    impl std::error::Error for Refused {}

    fn props(module: &str) -> ModuleProps {
        ModuleProps::new(module.to_string(), Default::default(), Dependencies::default())
    }

    #[test]
    fn trait_factories_construct_erased_instances() {
        let factory: BoxedFactory = Arc::new(GreeterFactory);
        assert_eq!(factory.supplies(), TypeInfo::of::<Greeter>());

        let instance = block_on(factory.construct(props("greeter"))).unwrap();
        let greeter = instance.downcast::<Greeter>().unwrap();
        assert_eq!(greeter.greeting, "hello from greeter");
    }

    #[test]
    fn async_functions_are_factories() {
        let factory: BoxedFactory = Arc::new(FnFactory::new(|props: ModuleProps| async move {
            Ok::<_, Infallible>(props.module().len())
        }));

        let instance = block_on(factory.construct(props("four"))).unwrap();
        assert_eq!(*instance.downcast::<usize>().unwrap(), 4);
    }

    #[test]
    fn sync_factory_errors_are_boxed() {
        let factory: BoxedFactory = Arc::new(SyncFactory::new(|_: ModuleProps| {
            Err::<Greeter, _>(Refused)
        }));

        let error = block_on(factory.construct(props("greeter"))).unwrap_err();
        assert_eq!(error.to_string(), "refused");
    }
}
