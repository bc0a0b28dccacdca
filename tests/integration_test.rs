use std::fs::File;
use std::io::Cursor;
use std::path::Path;

use approx::assert_relative_eq;
use arrow::array::{Array, Float32Array, Int32Array, ListArray};
use arrow::record_batch::RecordBatch;
use evtflat::prelude::*;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

fn read_table(path: &Path) -> Vec<RecordBatch> {
    ParquetRecordBatchReaderBuilder::try_new(File::open(path).unwrap())
        .unwrap()
        .build()
        .unwrap()
        .map(|b| b.unwrap())
        .collect()
}

fn scalar_column(batches: &[RecordBatch], name: &str) -> Vec<i32> {
    batches
        .iter()
        .flat_map(|b| {
            b.column_by_name(name)
                .unwrap()
                .as_any()
                .downcast_ref::<Int32Array>()
                .unwrap()
                .values()
                .to_vec()
        })
        .collect()
}

fn f32_array_column(batches: &[RecordBatch], name: &str) -> Vec<Vec<f32>> {
    let mut out = Vec::new();
    for batch in batches {
        let list = batch
            .column_by_name(name)
            .unwrap()
            .as_any()
            .downcast_ref::<ListArray>()
            .unwrap();
        for i in 0..list.len() {
            let values = list.value(i);
            let values = values.as_any().downcast_ref::<Float32Array>().unwrap();
            out.push(values.values().to_vec());
        }
    }
    out
}

fn photon(energy: f64, ecal: f32, hcal: f32) -> ReconstructedParticle {
    ReconstructedParticle {
        particle_type: 22,
        energy,
        momentum: [energy, 0.0, 0.0],
        clusters: vec![Cluster {
            position: [1800.0, 0.0, 0.0],
            subdetector_energies: vec![ecal, hcal, 0.0, 0.0, 0.0, 0.0],
            calorimeter_hits: vec![
                CalorimeterHit {
                    energy: 0.5,
                    position: [1800.0, 1.0, 0.0],
                },
                CalorimeterHit {
                    energy: 0.5,
                    position: [1801.0, -1.0, 0.0],
                },
            ],
            ..Default::default()
        }],
        ..Default::default()
    }
}

fn muon_track() -> ReconstructedParticle {
    let mut track = Track {
        d0: 0.01,
        z0: -0.02,
        omega: 2e-4,
        tan_lambda: 0.3,
        ..Default::default()
    };
    track.cov_matrix[0] = 1e-4;
    track.cov_matrix[9] = 4e-4;
    ReconstructedParticle {
        particle_type: 13,
        energy: 45.0,
        momentum: [20.0, 20.0, 30.0],
        charge: -1.0,
        tracks: vec![track],
        ..Default::default()
    }
}

fn busy_event() -> Event {
    let mcps = vec![
        McParticle {
            energy: 45.1,
            momentum: [20.1, 19.9, 30.0],
            charge: -1.0,
            pdg: 13,
            generator_status: 1,
            ..Default::default()
        },
        McParticle {
            energy: 9.4,
            momentum: [9.4, 0.0, 0.0],
            pdg: 22,
            generator_status: 1,
            ..Default::default()
        },
    ];
    let pfos = vec![muon_track(), photon(9.0, 9.0, 5.0), photon(9.5, 9.0, 0.0)];
    Event::new(1, 0)
        .with_collection("MCParticle", Collection::McParticles(mcps))
        .with_collection("PandoraPFOs", Collection::ReconstructedParticles(pfos))
        .with_collection(
            "RecoMCTruthLink",
            Collection::Relations(vec![Relation::new(2, 0, 0.8), Relation::new(0, 0, 1.0)]),
        )
}

#[test]
fn testable_properties_in_rows() {
    let row = Flattener::default().flatten(&busy_event(), 0).unwrap();
    assert_eq!(row.nmcps(), 2);
    assert_eq!(row.npfos(), 3);
    assert_eq!(row.nclrhits(), 4);

    // trackless photons keep zeroed track fields
    assert_eq!(row.pfos[1].track, TrackRecord::default());
    assert_relative_eq!(row.pfos[0].track.d0sig, 1.0, epsilon = 1e-5);
    assert_relative_eq!(row.pfos[0].track.z0sig, -1.0, epsilon = 1e-5);

    assert_eq!(row.pfos[1].gamma_e, 0.0);
    assert_eq!(row.pfos[2].gamma_e, row.pfos[2].e);

    assert_eq!(row.pfos[2].mcr.nmcr, 1);
    assert_relative_eq!(row.pfos[2].mcr.weight, 0.8);
    assert_eq!(row.pfos[2].mcr.mcp.e, row.mcps[0].e);
    assert_eq!(row.pfos[1].mcr.nmcr, 0);
}

#[test]
fn parquet_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evtdata.parquet");
    let mut proc = EventFlattener::new(FlattenerConfig {
        output_file: path.clone(),
        batch_size: 2,
        ..Default::default()
    });
    proc.init().unwrap();
    proc.process_run_header(&RunHeader::default()).unwrap();
    proc.process_event(&busy_event()).unwrap();
    // second event only carries MC particles
    let sparse = Event::new(1, 1).with_collection(
        "MCParticle",
        Collection::McParticles(vec![McParticle {
            energy: 3.0,
            momentum: [0.0, 0.0, 3.0],
            ..Default::default()
        }]),
    );
    proc.process_event(&sparse).unwrap();
    proc.process_event(&Event::new(1, 2)).unwrap();
    proc.end().unwrap();

    let batches = read_table(&path);
    assert_eq!(batches.iter().map(RecordBatch::num_rows).sum::<usize>(), 3);
    assert_eq!(scalar_column(&batches, "evt"), vec![0, 1, 2]);
    assert_eq!(scalar_column(&batches, "npfos"), vec![3, 0, 0]);
    assert_eq!(scalar_column(&batches, "nmcps"), vec![2, 1, 0]);
    assert_eq!(scalar_column(&batches, "nclrhits"), vec![4, 0, 0]);

    let pfo_gamma_e = f32_array_column(&batches, "pfo_gamma_e");
    assert_eq!(pfo_gamma_e[0], vec![0.0, 0.0, 9.5]);
    assert!(pfo_gamma_e[1].is_empty());

    // nothing from the first event leaks into the second
    let mcp_e = f32_array_column(&batches, "mcp_e");
    assert_eq!(mcp_e[1], vec![3.0]);
    assert!(mcp_e[2].is_empty());
    assert!(f32_array_column(&batches, "clr_x")[1].is_empty());

    let mcr_weight = f32_array_column(&batches, "mcr_weight");
    assert_eq!(mcr_weight[0], vec![1.0, 0.0, 0.8]);
}

#[test]
fn json_lines_to_root() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("output.root");
    let input = [
        serde_json::to_string(&Record::RunHeader(RunHeader {
            run_number: 1,
            ..Default::default()
        }))
        .unwrap(),
        serde_json::to_string(&Record::Event(busy_event())).unwrap(),
        serde_json::to_string(&Record::Event(Event::new(1, 1))).unwrap(),
    ]
    .join("\n");
    let mut proc = EventFlattener::new(FlattenerConfig {
        output_file: path.clone(),
        ..Default::default()
    });
    let summary = run(&mut proc, RecordReader::new(Cursor::new(input))).unwrap();
    assert_eq!(summary, RunSummary { runs: 1, events: 2 });
    assert_eq!(proc.state(), ProcessorState::Ended);
    assert!(path.metadata().unwrap().len() > 0);
}

#[test]
fn oversized_event_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("evtdata.parquet");
    let mut proc = EventFlattener::new(FlattenerConfig {
        output_file: path.clone(),
        capacity: Capacity {
            clrhits: 3,
            ..Default::default()
        },
        ..Default::default()
    });
    let records = vec![
        Ok(Record::Event(Event::new(1, 0))),
        Ok(Record::Event(busy_event())),
        Ok(Record::Event(Event::new(1, 2))),
    ];
    let err = run(&mut proc, records).unwrap_err();
    assert!(matches!(
        err,
        SourceError::Processor(ProcessorError::Flatten(FlattenError::CapacityExceeded {
            array: "clrhits",
            count: 4,
            capacity: 3,
        }))
    ));
    // the output is still closed with the rows written before the failure
    assert_eq!(scalar_column(&read_table(&path), "evt"), vec![0]);
}

#[test]
fn demo_input() {
    let dir = tempfile::tempdir().unwrap();
    let mut steering = Path::new(env!("CARGO_MANIFEST_DIR")).to_path_buf();
    steering.push("demos/steering.toml");
    let mut config = FlattenerConfig::load(&steering).unwrap();
    config.output_file = dir.path().join("demo.parquet");
    let mut proc = EventFlattener::new(config.clone());
    let input = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/events.jsonl");
    let summary = run(&mut proc, RecordReader::open(&input).unwrap()).unwrap();
    assert_eq!(summary, RunSummary { runs: 1, events: 2 });

    let batches = read_table(&config.output_file);
    assert_eq!(scalar_column(&batches, "npfos"), vec![2, 0]);
    assert_eq!(scalar_column(&batches, "nclrhits"), vec![2, 0]);
    assert_eq!(scalar_column(&batches, "nmcps"), vec![2, 1]);
    let pfo_gamma_e = f32_array_column(&batches, "pfo_gamma_e");
    assert_eq!(pfo_gamma_e[0], vec![0.0, 9.5]);
}
