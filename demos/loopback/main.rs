use log::info;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sigbridge::core::marshal::{MarshalGroup, TargetStorage};
use sigbridge::core::signal::{SignalSpec, SignalVector};
use sigbridge::{
    Adapter, AdapterModel, CodecRegistry, MarshalResult, SignalRuntime, VariableDecl,
};

/// Loopback component: every commanded variable is handed straight back on
/// the matching actual-value variable of the same type.
#[derive(Default)]
struct LoopbackComponent {
    doubles: Vec<f64>,
    int32s: Vec<i32>,
    binaries: Vec<Option<Vec<u8>>>,
}

impl Adapter for LoopbackComponent {
    fn load(&mut self) -> MarshalResult<()> {
        info!("loopback component loaded");
        Ok(())
    }

    fn init(&mut self) -> MarshalResult<()> {
        Ok(())
    }

    fn set_variables(&mut self, group: &MarshalGroup) -> MarshalResult<()> {
        match &group.target {
            TargetStorage::Double(v) => self.doubles = v.clone(),
            TargetStorage::Int32(v) => self.int32s = v.clone(),
            TargetStorage::Binary(v) => self.binaries = v.clone(),
            TargetStorage::Bool(_) => {}
        }
        Ok(())
    }

    fn get_variables(&mut self, group: &mut MarshalGroup) -> MarshalResult<()> {
        match &mut group.target {
            TargetStorage::Double(v) => {
                for (slot, value) in v.iter_mut().zip(self.doubles.iter()) {
                    *slot = *value;
                }
            }
            TargetStorage::Int32(v) => {
                for (slot, value) in v.iter_mut().zip(self.int32s.iter()) {
                    *slot = *value;
                }
            }
            TargetStorage::Binary(v) => {
                for (slot, value) in v.iter_mut().zip(self.binaries.iter()) {
                    *slot = value.clone();
                }
            }
            TargetStorage::Bool(_) => {}
        }
        Ok(())
    }

    fn step(&mut self, _model_time: f64, end_time: f64) -> MarshalResult<f64> {
        Ok(end_time)
    }

    fn unload(&mut self) -> MarshalResult<()> {
        info!("loopback component unloaded");
        Ok(())
    }
}

fn declarations() -> Vec<VariableDecl> {
    vec![
        VariableDecl::new("torque_cmd", 0, "Real").with_causality("input"),
        VariableDecl::new("torque_act", 1, "Real").with_causality("output"),
        VariableDecl::new("mode_cmd", 2, "Integer").with_causality("input"),
        VariableDecl::new("mode_act", 3, "Integer").with_causality("output"),
        VariableDecl::new("frame_cmd", 4, "String")
            .with_causality("input")
            .with_encoding("ascii85"),
        VariableDecl::new("frame_act", 5, "String")
            .with_causality("output")
            .with_encoding("ascii85"),
    ]
}

fn main() -> Result<(), String> {
    env_logger::init();

    let registry = CodecRegistry::with_defaults();
    let mut model = AdapterModel::create(&declarations(), &registry, LoopbackComponent::default())
        .map_err(|e| e.to_string())?;

    println!("Marshal table:");
    for group in model.table().groups() {
        println!(
            "  {} count={} offset={}",
            group.name,
            group.count(),
            group.source_offset
        );
    }

    let torque_cmd = slot_of(&model, "torque_cmd");
    let torque_act = slot_of(&model, "torque_act");
    let frame_cmd = slot_of(&model, "frame_cmd");
    let frame_act = slot_of(&model, "frame_act");

    let mut rng = StdRng::seed_from_u64(42);
    let step_size = 0.005;
    for step in 1..=5u32 {
        let torque = rng.gen_range(-50.0..50.0);
        let payload: Vec<u8> = (0..rng.gen_range(4..24)).map(|_| rng.gen::<u8>()).collect();

        model.source_mut().scalar[torque_cmd] = torque;
        model.source_mut().binary[frame_cmd]
            .append(&payload)
            .map_err(|e| e.to_string())?;

        model.step(step as f64 * step_size).map_err(|e| e.to_string())?;

        let echoed = model.source().scalar[torque_act];
        let frame = model.source().binary[frame_act].as_bytes().to_vec();
        println!(
            "step {} t={:.3}: torque {:.2} -> {:.2}, frame {} bytes round-tripped: {}",
            step,
            model.model_time(),
            torque,
            echoed,
            payload.len(),
            frame == payload
        );
    }

    // The same declarations can also drive the bus-facing get/set boundary.
    let network = SignalVector::binary(
        "network",
        vec![SignalSpec::new("can")
            .with_vref(10)
            .with_bus_topology(vec![2, 4, 6, 8], vec![3, 5, 7, 9])
            .with_encoding("ascii85", vec![2, 3, 4, 5, 6, 7, 8, 9])],
    );
    let mut runtime = SignalRuntime::new(vec![network], &registry);
    let codec = registry.lookup("ascii85").unwrap();
    let frame = codec.encode(b"broadcast");
    runtime
        .write_binaries(&[2], &[Some(frame.as_slice())])
        .map_err(|e| e.to_string())?;
    let reads = runtime.read_binaries(&[3, 5, 7, 9]);
    println!(
        "bus fan-out: {} aliases delivered the broadcast frame",
        reads.iter().filter(|r| r.is_some()).count()
    );
    runtime.end_step();

    model.destroy().map_err(|e| e.to_string())?;
    Ok(())
}

fn slot_of(model: &AdapterModel<LoopbackComponent>, name: &str) -> usize {
    model
        .signals()
        .iter()
        .position(|s| s.name == name)
        .expect("declared signal is classified")
}
