use log::debug;

use crate::core::classifier::classify;
use crate::core::codec::CodecRegistry;
use crate::core::errors::MarshalResult;
use crate::core::marshal::{MarshalGroup, MarshalTable};
use crate::core::signal::SourceVector;
use crate::core::types::{Variable, VariableDecl};

/// Seam towards the adapted component's native entry-point table.
///
/// Implementations translate marshal group contents into whatever call
/// convention the component exposes. All calls are synchronous and
/// non-blocking; errors surface as `MarshalError::Adapter` (or any other
/// variant the implementation finds fitting).
pub trait Adapter {
    fn load(&mut self) -> MarshalResult<()>;
    fn init(&mut self) -> MarshalResult<()>;
    /// Push one outbound group's target block into the component.
    fn set_variables(&mut self, group: &MarshalGroup) -> MarshalResult<()>;
    /// Pull the component's values into one inbound group's target block.
    fn get_variables(&mut self, group: &mut MarshalGroup) -> MarshalResult<()>;
    /// Advance the component; returns the reached model time.
    fn step(&mut self, model_time: f64, end_time: f64) -> MarshalResult<f64>;
    fn unload(&mut self) -> MarshalResult<()>;
}

/// Per-step driver binding a classified signal set, its marshal table and
/// flat source storage to one adapter instance.
pub struct AdapterModel<A: Adapter> {
    signals: Vec<Variable>,
    source: SourceVector,
    table: MarshalTable,
    adapter: A,
    model_time: f64,
}

impl<A: Adapter> AdapterModel<A> {
    /// Build the model: classify, allocate the source vector, generate the
    /// marshal table, install codecs, then load and initialize the adapter.
    /// Build-time errors abort creation; the model cannot start.
    pub fn create(
        decls: &[VariableDecl],
        registry: &CodecRegistry,
        adapter: A,
    ) -> MarshalResult<Self> {
        let signals = classify(decls);
        let source = SourceVector::allocate(&signals);
        let mut table = MarshalTable::generate(&signals)?;
        table.install_codecs(&signals, registry);

        let mut model = Self {
            signals,
            source,
            table,
            adapter,
            model_time: 0.0,
        };
        model.adapter.load()?;
        model.adapter.init()?;
        debug!(
            "adapter model created: {} signals, {} groups",
            model.signals.len(),
            model.table.len()
        );
        Ok(model)
    }

    pub fn signals(&self) -> &[Variable] {
        &self.signals
    }

    pub fn source(&self) -> &SourceVector {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut SourceVector {
        &mut self.source
    }

    pub fn table(&self) -> &MarshalTable {
        &self.table
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn model_time(&self) -> f64 {
        self.model_time
    }

    /// Signal-to-component pass: marshal each outbound group and hand it to
    /// the adapter. A failure aborts the remaining groups of this pass.
    pub fn marshal_out(&mut self) -> MarshalResult<()> {
        for group in self.table.groups_mut() {
            if !group.dir.marshals_out() {
                continue;
            }
            group.marshal_out(&self.source)?;
            self.adapter.set_variables(group)?;
        }
        Ok(())
    }

    /// Component-to-signal pass: fetch each inbound group from the adapter
    /// and marshal it back into the source vector. Binary appends run
    /// behind the once-per-step reset gate.
    pub fn marshal_in(&mut self) -> MarshalResult<()> {
        self.source.reset_binary();
        for group in self.table.groups_mut() {
            if !group.dir.marshals_in() {
                continue;
            }
            self.adapter.get_variables(group)?;
            group.marshal_in(&mut self.source)?;
        }
        Ok(())
    }

    /// One full simulation step: marshal out, step the component, marshal
    /// in, then re-arm the binary reset gates.
    pub fn step(&mut self, end_time: f64) -> MarshalResult<()> {
        self.marshal_out()?;
        self.model_time = self.adapter.step(self.model_time, end_time)?;
        self.marshal_in()?;
        self.source.clear_reset_flags();
        Ok(())
    }

    /// Unload the adapter and consume the model.
    pub fn destroy(mut self) -> MarshalResult<()> {
        self.adapter.unload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::MarshalError;
    use crate::core::marshal::TargetStorage;
    use crate::core::types::MarshalDir;

    /// Test adapter: doubles every inbound scalar it is handed and offers
    /// the result back on outbound groups of the same type.
    #[derive(Default)]
    struct MockAdapter {
        loaded: bool,
        initialized: bool,
        steps: u32,
        latched_double: Vec<f64>,
        latched_int32: Vec<i32>,
        fail_step: bool,
    }

    impl Adapter for MockAdapter {
        fn load(&mut self) -> MarshalResult<()> {
            self.loaded = true;
            Ok(())
        }

        fn init(&mut self) -> MarshalResult<()> {
            self.initialized = true;
            Ok(())
        }

        fn set_variables(&mut self, group: &MarshalGroup) -> MarshalResult<()> {
            match &group.target {
                TargetStorage::Double(values) => {
                    self.latched_double = values.iter().map(|v| v * 2.0).collect();
                }
                TargetStorage::Int32(values) => {
                    self.latched_int32 = values.iter().map(|v| v * 2).collect();
                }
                _ => {}
            }
            Ok(())
        }

        fn get_variables(&mut self, group: &mut MarshalGroup) -> MarshalResult<()> {
            match &mut group.target {
                TargetStorage::Double(values) => {
                    for (slot, latched) in values.iter_mut().zip(self.latched_double.iter()) {
                        *slot = *latched;
                    }
                }
                TargetStorage::Int32(values) => {
                    for (slot, latched) in values.iter_mut().zip(self.latched_int32.iter()) {
                        *slot = *latched;
                    }
                }
                _ => {}
            }
            Ok(())
        }

        fn step(&mut self, _model_time: f64, end_time: f64) -> MarshalResult<f64> {
            if self.fail_step {
                return Err(MarshalError::Adapter("component refused to step".into()));
            }
            self.steps += 1;
            Ok(end_time)
        }

        fn unload(&mut self) -> MarshalResult<()> {
            self.loaded = false;
            Ok(())
        }
    }

    fn decls() -> Vec<VariableDecl> {
        vec![
            VariableDecl::new("speed_cmd", 0, "Real").with_causality("input"),
            VariableDecl::new("speed_act", 1, "Real").with_causality("output"),
            VariableDecl::new("gear_cmd", 2, "Integer").with_causality("input"),
            VariableDecl::new("gear_act", 3, "Integer").with_causality("output"),
        ]
    }

    #[test]
    fn test_create_loads_and_inits() {
        let model =
            AdapterModel::create(&decls(), &CodecRegistry::with_defaults(), MockAdapter::default())
                .unwrap();
        assert!(model.adapter().loaded);
        assert!(model.adapter().initialized);
        assert_eq!(model.table().len(), 4);
        assert_eq!(model.model_time(), 0.0);
    }

    #[test]
    fn test_step_round_trips_through_adapter() {
        let mut model =
            AdapterModel::create(&decls(), &CodecRegistry::with_defaults(), MockAdapter::default())
                .unwrap();

        // Classified order: int32 rx [3], int32 tx [2], double rx [1],
        // double tx [0]; source slots follow that order.
        let tx_double_slot = model
            .signals()
            .iter()
            .position(|s| s.name == "speed_cmd")
            .unwrap();
        let rx_double_slot = model
            .signals()
            .iter()
            .position(|s| s.name == "speed_act")
            .unwrap();
        model.source_mut().scalar[tx_double_slot] = 21.0;

        model.step(0.005).unwrap();
        assert_eq!(model.model_time(), 0.005);
        assert_eq!(model.adapter().steps, 1);
        // The component doubled the commanded value and the result was
        // marshaled back into the actual-value signal.
        assert_eq!(model.source().scalar[rx_double_slot], 42.0);
    }

    #[test]
    fn test_step_failure_propagates() {
        let adapter = MockAdapter {
            fail_step: true,
            ..MockAdapter::default()
        };
        let mut model =
            AdapterModel::create(&decls(), &CodecRegistry::with_defaults(), adapter).unwrap();
        let err = model.step(0.005).unwrap_err();
        assert!(matches!(err, MarshalError::Adapter(_)));
        // Model time does not advance on failure.
        assert_eq!(model.model_time(), 0.0);
    }

    #[test]
    fn test_marshal_out_skips_inbound_groups() {
        let mut model =
            AdapterModel::create(&decls(), &CodecRegistry::with_defaults(), MockAdapter::default())
                .unwrap();
        for value in model.source_mut().scalar.iter_mut() {
            *value = 9.0;
        }
        model.marshal_out().unwrap();
        for group in model.table().groups() {
            if group.dir == MarshalDir::RxOnly {
                match &group.target {
                    TargetStorage::Double(v) => assert!(v.iter().all(|x| *x == 0.0)),
                    TargetStorage::Int32(v) => assert!(v.iter().all(|x| *x == 0)),
                    _ => {}
                }
            }
        }
    }

    #[test]
    fn test_destroy_unloads() {
        let model =
            AdapterModel::create(&decls(), &CodecRegistry::with_defaults(), MockAdapter::default())
                .unwrap();
        model.destroy().unwrap();
    }
}
