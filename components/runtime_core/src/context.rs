//! The runtime context
//!
//! All process-wide state in one explicit struct: registries of linked
//! classes/methods/fields, loaded units with their resolution caches,
//! the interned-string table, the heap, the thread registry, and the
//! native-method registry. Constructed once at startup and injected
//! into every component; a guard makes reentrant initialization an
//! error instead of a double bootstrap.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use class_model::{ClassDef, CodeUnit, FieldDef, MethodDef, UnitCache};
use core_types::{
    ClassId, ExecResult, FieldId, JValue, MethodId, ObjRef, RuntimeOptions, UnitId, VmError,
};
use memory_manager::Heap;
use parking_lot::{Mutex, RwLock};

use crate::thread::{ThreadRegistry, VmThread};

/// A native method implementation.
///
/// Receives the implicit environment (context + thread), the receiver
/// (or class object for static methods), and the marshaled arguments.
pub type NativeFn =
    fn(&RuntimeContext, &mut VmThread, JValue, &[JValue]) -> ExecResult<JValue>;

/// Callback seam through which lower layers run interpreted code
/// (notably class initializers) without depending on the interpreter.
pub trait Invoker: Send + Sync {
    /// Invoke a static method with no receiver.
    fn invoke_static(
        &self,
        ctx: &RuntimeContext,
        thread: &mut VmThread,
        method: MethodId,
        args: &[JValue],
    ) -> ExecResult<JValue>;
}

/// One loaded unit plus its lazy resolution rows.
#[derive(Debug)]
pub struct LoadedUnit {
    /// The immutable unit.
    pub unit: Arc<CodeUnit>,
    /// Its resolution cache.
    pub cache: Arc<UnitCache>,
}

/// Ids of the built-in classes every component needs by name.
#[derive(Debug, Clone, Copy)]
#[allow(missing_docs)]
pub struct WellKnown {
    pub object: ClassId,
    pub string: ClassId,
    pub class: ClassId,
    pub throwable: ClassId,
    pub null_pointer: ClassId,
    pub arithmetic: ClassId,
    pub array_bounds: ClassId,
    pub array_store: ClassId,
    pub negative_array_size: ClassId,
    pub class_cast: ClassId,
    pub class_not_found: ClassId,
    pub no_such_method: ClassId,
    pub no_such_field: ClassId,
    pub linkage: ClassId,
    pub instantiation: ClassId,
    pub illegal_monitor_state: ClassId,
    pub out_of_memory: ClassId,
    pub stack_overflow: ClassId,
    pub initializer_error: ClassId,
}

/// Process-wide runtime state.
pub struct RuntimeContext {
    /// Startup options, immutable.
    pub options: RuntimeOptions,
    /// The object heap.
    pub heap: Heap,
    /// All attached threads and the global locks.
    pub threads: ThreadRegistry,

    classes: RwLock<Vec<Arc<ClassDef>>>,
    class_names: RwLock<HashMap<Arc<str>, ClassId>>,
    methods: RwLock<Vec<Arc<MethodDef>>>,
    fields: RwLock<Vec<Arc<FieldDef>>>,
    units: RwLock<Vec<LoadedUnit>>,
    interns: Mutex<HashMap<Arc<str>, ObjRef>>,
    natives: RwLock<HashMap<(Arc<str>, Arc<str>, Arc<str>), NativeFn>>,

    invoker: OnceLock<Arc<dyn Invoker>>,
    well_known: OnceLock<WellKnown>,
    preallocated_oom: OnceLock<ObjRef>,
    bootstrapped: AtomicBool,
    linker_lock: Mutex<()>,
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("classes", &self.classes.read().len())
            .field("methods", &self.methods.read().len())
            .field("units", &self.units.read().len())
            .field("heap_bytes", &self.heap.bytes_used())
            .finish()
    }
}

impl RuntimeContext {
    /// New context with built-in classes registered.
    pub fn new(options: RuntimeOptions) -> Result<Self, VmError> {
        let ctx = Self {
            heap: Heap::new(options.heap_max_bytes),
            options,
            threads: ThreadRegistry::new(),
            classes: RwLock::new(Vec::new()),
            class_names: RwLock::new(HashMap::new()),
            methods: RwLock::new(Vec::new()),
            fields: RwLock::new(Vec::new()),
            units: RwLock::new(Vec::new()),
            interns: Mutex::new(HashMap::new()),
            natives: RwLock::new(HashMap::new()),
            invoker: OnceLock::new(),
            well_known: OnceLock::new(),
            preallocated_oom: OnceLock::new(),
            bootstrapped: AtomicBool::new(false),
            linker_lock: Mutex::new(()),
        };
        ctx.bootstrap()?;
        Ok(ctx)
    }

    fn bootstrap(&self) -> Result<(), VmError> {
        if self.bootstrapped.swap(true, Ordering::AcqRel) {
            return Err(VmError::AlreadyInitialized);
        }
        let well_known = crate::builtin::register_builtins(self);
        self.well_known
            .set(well_known)
            .expect("well-known set twice");

        // The one exception that must exist even when allocation fails
        let oom_class = self.class(well_known.out_of_memory);
        let oom = self
            .heap
            .alloc_instance(oom_class.id, oom_class.instance_slots)
            .ok_or_else(|| VmError::BadOption("heap too small for bootstrap".into()))?;
        self.preallocated_oom.set(oom).expect("oom set twice");
        log::info!(
            "runtime bootstrapped: {} built-in classes",
            self.classes.read().len()
        );
        Ok(())
    }

    /// The well-known class ids.
    pub fn well_known(&self) -> &WellKnown {
        self.well_known.get().expect("context not bootstrapped")
    }

    /// The preallocated out-of-memory exception instance.
    pub fn preallocated_oom(&self) -> ObjRef {
        *self.preallocated_oom.get().expect("context not bootstrapped")
    }

    /// Install the interpreter as the invoke engine. Once per process.
    pub fn set_invoker(&self, invoker: Arc<dyn Invoker>) {
        if self.invoker.set(invoker).is_err() {
            panic!("invoker installed twice");
        }
    }

    /// The installed invoke engine.
    pub fn invoker(&self) -> &Arc<dyn Invoker> {
        self.invoker.get().expect("no invoker installed")
    }

    // ---- registries ----

    /// Register a linked class. The caller must have built `id` with
    /// [`RuntimeContext::reserve_class_id`].
    pub fn register_class(&self, class: Arc<ClassDef>) {
        let mut classes = self.classes.write();
        debug_assert_eq!(classes.len(), class.id.0 as usize);
        self.class_names
            .write()
            .insert(class.name.clone(), class.id);
        classes.push(class);
    }

    /// Reserve the id the next registered class will get.
    ///
    /// Linking needs the id before the `ClassDef` exists (methods refer
    /// to their declaring class). Callers hold the linker lock, so the
    /// reservation cannot interleave.
    pub fn reserve_class_id(&self) -> ClassId {
        ClassId(self.classes.read().len() as u32)
    }

    /// Serialize class registration across threads. Held for the span
    /// of linking one unit or creating one array class.
    pub fn linker_guard(&self) -> parking_lot::MutexGuard<'_, ()> {
        self.linker_lock.lock()
    }

    /// Class by id.
    pub fn class(&self, id: ClassId) -> Arc<ClassDef> {
        self.classes.read()[id.0 as usize].clone()
    }

    /// Class by internal name.
    pub fn find_class(&self, name: &str) -> Option<ClassId> {
        self.class_names.read().get(name).copied()
    }

    /// Register a linked method, assigning its id.
    pub fn register_method(&self, build: impl FnOnce(MethodId) -> MethodDef) -> Arc<MethodDef> {
        let mut methods = self.methods.write();
        let id = MethodId(methods.len() as u32);
        let def = Arc::new(build(id));
        methods.push(def.clone());
        def
    }

    /// Method by id.
    pub fn method(&self, id: MethodId) -> Arc<MethodDef> {
        self.methods.read()[id.0 as usize].clone()
    }

    /// Declared method of a class by name and shorty.
    pub fn find_method_in(
        &self,
        class: ClassId,
        name: &str,
        shorty: &str,
    ) -> Option<Arc<MethodDef>> {
        let def = self.class(class);
        def.methods
            .iter()
            .map(|&mid| self.method(mid))
            .find(|m| &*m.name == name && &*m.shorty == shorty)
    }

    /// Register a linked field, assigning its id.
    pub fn register_field(&self, build: impl FnOnce(FieldId) -> FieldDef) -> Arc<FieldDef> {
        let mut fields = self.fields.write();
        let id = FieldId(fields.len() as u32);
        let def = Arc::new(build(id));
        fields.push(def.clone());
        def
    }

    /// Field by id.
    pub fn field(&self, id: FieldId) -> Arc<FieldDef> {
        self.fields.read()[id.0 as usize].clone()
    }

    /// Load a unit, creating its resolution cache.
    pub fn load_unit(&self, unit: CodeUnit) -> UnitId {
        let cache = Arc::new(UnitCache::for_unit(&unit));
        let mut units = self.units.write();
        let id = UnitId(units.len() as u32);
        units.push(LoadedUnit {
            unit: Arc::new(unit),
            cache,
        });
        log::debug!("loaded unit {:?}", id);
        id
    }

    /// A loaded unit and its cache.
    pub fn unit(&self, id: UnitId) -> (Arc<CodeUnit>, Arc<UnitCache>) {
        let units = self.units.read();
        let lu = &units[id.0 as usize];
        (lu.unit.clone(), lu.cache.clone())
    }

    /// Number of loaded units.
    pub fn unit_count(&self) -> usize {
        self.units.read().len()
    }

    // ---- interned strings ----

    /// Intern a string, allocating its object on first use. Returns
    /// None when the heap budget is exhausted.
    pub fn intern(&self, text: &Arc<str>) -> Option<ObjRef> {
        let mut interns = self.interns.lock();
        if let Some(&handle) = interns.get(text) {
            return Some(handle);
        }
        let handle = self
            .heap
            .alloc_string(self.well_known().string, text.clone())?;
        interns.insert(text.clone(), handle);
        Some(handle)
    }

    // ---- native registry ----

    /// Register a native method implementation.
    pub fn register_native(&self, class: &str, name: &str, shorty: &str, func: NativeFn) {
        self.natives.write().insert(
            (Arc::from(class), Arc::from(name), Arc::from(shorty)),
            func,
        );
    }

    /// Look up a native implementation.
    pub fn find_native(&self, class: &str, name: &str, shorty: &str) -> Option<NativeFn> {
        // Key by owned strings to avoid borrowing issues; lookups are
        // cached by the caller via the resolved method's arg hints
        let key = (Arc::from(class), Arc::from(name), Arc::from(shorty));
        self.natives.read().get(&key).copied()
    }

    // ---- type relations ----

    /// Whether `sub` is assignable to `sup` (class identity, superclass
    /// chain, or implemented interface).
    pub fn is_assignable(&self, sup: ClassId, sub: ClassId) -> bool {
        if sup == sub {
            return true;
        }
        let mut cursor = Some(sub);
        while let Some(id) = cursor {
            let class = self.class(id);
            if id == sup {
                return true;
            }
            for &iface in &class.interfaces {
                if self.is_assignable(sup, iface) {
                    return true;
                }
            }
            cursor = class.superclass;
        }
        false
    }
}
