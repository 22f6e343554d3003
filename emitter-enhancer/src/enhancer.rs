//! 增强器（Enhancer）
//!
//! 三种增强策略产出相同的能力集合（`EnhancedEmitter<E>`）：
//! - `extend::<E>()`：得到新的独立类型 `EnhancedType<E>`，`E` 本身不受影响；
//! - `modify::<E>()`：在进程范围内标记 `E` 本身已增强，之后该类型只能以增强形态创建；
//! - `modify_instance(base)`：仅增强给定的实例。
//!
//! 重复增强（同一类型二次 `modify`、对已标记类型 `extend`、对已增强实例再次增强）
//! 一律返回 `EmitterError::DoubleEnhancement`。
//!
use crate::config::{EnhanceMode, EnhancerConfig};
use crate::enhanced::EnhancedEmitter;
use crate::scheduler::{DeferredScheduler, TokioScheduler};
use bon::Builder;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use emitter_core::{BaseEmitter, EmitterError, EmitterResult};
use std::any::{TypeId, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, LazyLock};

/// 类型在增强注册表中的身份
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Marking {
    /// 由增强产出的类型（`EnhancedEmitter<E>`）
    Derived,
    /// 经 `modify` 就地标记的基础类型
    Modified,
}

static REGISTRY: LazyLock<DashMap<TypeId, Marking>> = LazyLock::new(DashMap::new);

fn mark_derived<E: BaseEmitter>() {
    REGISTRY
        .entry(TypeId::of::<EnhancedEmitter<E>>())
        .or_insert(Marking::Derived);
}

/// 类型 `T` 是否已携带增强能力（增强产出的类型或被 `modify` 标记的类型）
pub fn is_enhanced_type<T: 'static>() -> bool {
    REGISTRY.contains_key(&TypeId::of::<T>())
}

fn default_scheduler() -> Arc<dyn DeferredScheduler> {
    Arc::new(TokioScheduler::new())
}

/// 增强器：持有配置与共享调度器
///
/// 同一增强器创建的所有发射器共享一个调度器，即共享一条延迟任务队列。
#[derive(Builder, Clone)]
pub struct Enhancer {
    #[builder(default)]
    config: EnhancerConfig,
    #[builder(default = default_scheduler())]
    scheduler: Arc<dyn DeferredScheduler>,
}

impl Default for Enhancer {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for Enhancer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Enhancer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Enhancer {
    pub fn new(config: EnhancerConfig) -> Self {
        Self::builder().config(config).build()
    }

    pub fn config(&self) -> &EnhancerConfig {
        &self.config
    }

    pub fn scheduler(&self) -> &Arc<dyn DeferredScheduler> {
        &self.scheduler
    }

    fn enhanced_type<E: BaseEmitter>(&self, mode: EnhanceMode) -> EnhancedType<E> {
        EnhancedType {
            config: EnhancerConfig {
                mode,
                ..self.config.clone()
            },
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        }
    }

    /// 派生新的增强类型；`E` 已携带增强时失败
    pub fn extend<E: BaseEmitter>(&self) -> EmitterResult<EnhancedType<E>> {
        if is_enhanced_type::<E>() {
            return Err(EmitterError::double_enhancement(type_name::<E>()));
        }
        mark_derived::<E>();
        tracing::debug!(target_type = type_name::<E>(), "extended emitter type");
        Ok(self.enhanced_type(EnhanceMode::Extend))
    }

    /// 就地标记 `E`：此后 `E` 的实例只能经返回的 `EnhancedType` 以增强形态创建
    pub fn modify<E: BaseEmitter>(&self) -> EmitterResult<EnhancedType<E>> {
        self.mark_modified::<E>(false)
    }

    fn mark_modified<E: BaseEmitter>(&self, reuse: bool) -> EmitterResult<EnhancedType<E>> {
        match REGISTRY.entry(TypeId::of::<E>()) {
            Entry::Occupied(entry) if reuse && *entry.get() == Marking::Modified => {}
            Entry::Occupied(_) => {
                return Err(EmitterError::double_enhancement(type_name::<E>()));
            }
            Entry::Vacant(entry) => {
                entry.insert(Marking::Modified);
                tracing::debug!(target_type = type_name::<E>(), "modified emitter type");
            }
        }
        mark_derived::<E>();
        Ok(self.enhanced_type(EnhanceMode::Modify))
    }

    /// 增强单个实例；实例已增强时失败
    pub fn modify_instance<E: BaseEmitter>(
        &self,
        base: E,
    ) -> EmitterResult<Arc<EnhancedEmitter<E>>> {
        if base.is_enhanced() {
            return Err(EmitterError::double_enhancement(type_name::<E>()));
        }
        mark_derived::<E>();
        Ok(self.enhanced_type(EnhanceMode::ModifyInstance).create(base))
    }

    /// 按配置的策略增强实例
    ///
    /// `Modify` 策略下首次调用标记类型，之后的调用复用该标记。
    pub fn enhance<E: BaseEmitter>(&self, base: E) -> EmitterResult<Arc<EnhancedEmitter<E>>> {
        match self.config.mode {
            EnhanceMode::Extend => {
                if base.is_enhanced() {
                    return Err(EmitterError::double_enhancement(type_name::<E>()));
                }
                Ok(self.extend::<E>()?.create(base))
            }
            EnhanceMode::Modify => {
                if base.is_enhanced() {
                    return Err(EmitterError::double_enhancement(type_name::<E>()));
                }
                Ok(self.mark_modified::<E>(true)?.create(base))
            }
            EnhanceMode::ModifyInstance => self.modify_instance(base),
        }
    }
}

/// 增强后的类型：以基础发射器实例创建 `EnhancedEmitter<E>`
pub struct EnhancedType<E: BaseEmitter> {
    config: EnhancerConfig,
    scheduler: Arc<dyn DeferredScheduler>,
    _marker: PhantomData<fn() -> E>,
}

impl<E: BaseEmitter> Clone for EnhancedType<E> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            scheduler: self.scheduler.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E: BaseEmitter> fmt::Debug for EnhancedType<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancedType")
            .field("base", &type_name::<E>())
            .field("mode", &self.config.mode)
            .finish()
    }
}

impl<E: BaseEmitter> EnhancedType<E> {
    pub fn mode(&self) -> EnhanceMode {
        self.config.mode
    }

    pub fn create(&self, base: E) -> Arc<EnhancedEmitter<E>> {
        EnhancedEmitter::new_shared(base, &self.config, self.scheduler.clone())
    }

    pub fn create_default(&self) -> Arc<EnhancedEmitter<E>>
    where
        E: Default,
    {
        self.create(E::default())
    }
}
