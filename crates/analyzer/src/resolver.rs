use crate::config::AnalyzerConfig;
use crate::error::{Result, SemconvError};
use crate::loader::PackageLoader;
use crate::symbols::PackageSymbols;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Resolves semconv package paths to their symbol tables, analyzing each
/// path at most once.
///
/// Concurrent first requests for the same path rendezvous on a single load.
/// A failed load is reported to the requester that performed it; everyone
/// else sees the package as unresolved.
pub struct PackageResolver {
    loader: Arc<dyn PackageLoader>,
    config: AnalyzerConfig,
    cache: Mutex<HashMap<String, PackageEntry>>,
    analyzed: AtomicUsize,
}

#[derive(Clone)]
enum PackageEntry {
    Ready(Arc<PackageSymbols>),
    Failed,
    Loading(LoadWaiter),
}

#[derive(Clone)]
struct LoadWaiter {
    state: Arc<(Mutex<LoadState>, Condvar)>,
}

struct LoadState {
    done: bool,
    symbols: Option<Arc<PackageSymbols>>,
}

impl LoadWaiter {
    fn new() -> Self {
        Self {
            state: Arc::new((
                Mutex::new(LoadState {
                    done: false,
                    symbols: None,
                }),
                Condvar::new(),
            )),
        }
    }

    fn finish(&self, symbols: Option<Arc<PackageSymbols>>) {
        let (lock, cv) = &*self.state;
        {
            let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            guard.done = true;
            guard.symbols = symbols;
        }
        cv.notify_all();
    }

    fn wait(&self) -> Option<Arc<PackageSymbols>> {
        let (lock, cv) = &*self.state;
        let mut guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        while !guard.done {
            guard = cv.wait(guard).unwrap_or_else(PoisonError::into_inner);
        }
        guard.symbols.clone()
    }
}

impl PackageResolver {
    pub fn new(loader: Arc<dyn PackageLoader>, config: AnalyzerConfig) -> Self {
        Self {
            loader,
            config,
            cache: Mutex::new(HashMap::new()),
            analyzed: AtomicUsize::new(0),
        }
    }

    /// Number of package analyses performed so far (successful or not)
    pub fn packages_analyzed(&self) -> usize {
        self.analyzed.load(Ordering::SeqCst)
    }

    /// Attribute key of constant `name` in `package_path`
    pub fn constant_key(&self, package_path: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .symbols(package_path)?
            .and_then(|symbols| symbols.constant_key(name).map(str::to_string)))
    }

    /// Attribute key produced by function `name` in `package_path`
    pub fn function_key(&self, package_path: &str, name: &str) -> Result<Option<String>> {
        Ok(self
            .symbols(package_path)?
            .and_then(|symbols| symbols.function_key(name).map(str::to_string)))
    }

    /// Symbol tables for `package_path`.
    ///
    /// `Ok(None)` means the package is known to be unusable and its failure
    /// has already been reported.
    pub fn symbols(&self, package_path: &str) -> Result<Option<Arc<PackageSymbols>>> {
        enum Lookup {
            Wait(LoadWaiter),
            Load(LoadWaiter),
        }

        let lookup = {
            let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            match cache.get(package_path) {
                Some(PackageEntry::Ready(symbols)) => return Ok(Some(symbols.clone())),
                Some(PackageEntry::Failed) => return Ok(None),
                Some(PackageEntry::Loading(waiter)) => Lookup::Wait(waiter.clone()),
                None => {
                    let waiter = LoadWaiter::new();
                    cache.insert(
                        package_path.to_string(),
                        PackageEntry::Loading(waiter.clone()),
                    );
                    Lookup::Load(waiter)
                }
            }
        };

        match lookup {
            Lookup::Wait(waiter) => Ok(waiter.wait()),
            Lookup::Load(waiter) => {
                let loaded = self.load_symbols(package_path);
                let (entry, published, outcome) = match loaded {
                    Ok(symbols) => {
                        let symbols = Arc::new(symbols);
                        (
                            PackageEntry::Ready(symbols.clone()),
                            Some(symbols.clone()),
                            Ok(Some(symbols)),
                        )
                    }
                    Err(err) => (PackageEntry::Failed, None, Err(err)),
                };
                {
                    let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
                    cache.insert(package_path.to_string(), entry);
                }
                waiter.finish(published);
                outcome
            }
        }
    }

    fn load_symbols(&self, package_path: &str) -> Result<PackageSymbols> {
        self.analyzed.fetch_add(1, Ordering::SeqCst);
        log::info!("analyzing package {package_path}");

        let mut packages = self.loader.load(package_path)?.into_iter();
        let package = packages
            .next()
            .ok_or_else(|| SemconvError::package_load(package_path, "package not found"))?;
        let extra = packages.count();
        if extra > 0 {
            log::warn!(
                "{} packages found for {package_path}; using the first ({})",
                extra + 1,
                package.dir.display()
            );
        }
        log::debug!(
            "package {package_path}: name {}, {} files in {}",
            package.name.as_deref().unwrap_or("<unknown>"),
            package.files.len(),
            package.dir.display()
        );

        if !package.errors.is_empty() {
            return Err(SemconvError::package_load(
                package_path,
                package.errors.join("; "),
            ));
        }

        PackageSymbols::analyze(&package, &self.config)
    }
}
