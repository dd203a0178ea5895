use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ort::session::builder::GraphOptimizationLevel;
use sentiment_server::{BuiltinModel, ModelManager, RuntimeConfig, SentimentClassifier};

const SHORT_TEXT: &str = "I love this!";
const MEDIUM_TEXT: &str = "The delivery was late and the packaging was damaged, \
     but customer support resolved everything quickly and politely. \
     Overall I am fairly satisfied with the purchase.";

fn ensure_model() {
    let manager = ModelManager::new_default().unwrap();
    let info = BuiltinModel::MultilingualSentiment.get_model_info();
    tokio_test::block_on(manager.ensure_model_downloaded(&info)).unwrap();
}

fn setup_classifier(config: RuntimeConfig) -> SentimentClassifier {
    SentimentClassifier::builder()
        .with_runtime_config(config)
        .with_model(BuiltinModel::MultilingualSentiment)
        .unwrap()
        .build()
        .unwrap()
}

fn bench_tokenization(c: &mut Criterion) {
    ensure_model();
    let classifier = setup_classifier(RuntimeConfig::default());
    let mut group = c.benchmark_group("Tokenization");
    group.sample_size(50);
    group.warm_up_time(std::time::Duration::from_secs(1));

    group.bench_function("short_text", |b| b.iter(|| {
        classifier.count_tokens(black_box(SHORT_TEXT)).unwrap()
    }));
    group.bench_function("medium_text", |b| b.iter(|| {
        classifier.count_tokens(black_box(MEDIUM_TEXT)).unwrap()
    }));

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    ensure_model();
    let mut group = c.benchmark_group("Prediction");
    group.sample_size(30);
    group.warm_up_time(std::time::Duration::from_secs(1));

    let configs = vec![
        ("single_thread", RuntimeConfig {
            inter_threads: 1,
            intra_threads: 1,
            optimization_level: GraphOptimizationLevel::Level1,
        }),
        ("optimized", RuntimeConfig::default()),
    ];

    for (name, config) in configs {
        let classifier = setup_classifier(config);
        group.bench_function(format!("predict_{}", name), |b| b.iter(|| {
            classifier.predict(black_box(MEDIUM_TEXT)).unwrap()
        }));
    }

    group.finish();
}

fn bench_input_length(c: &mut Criterion) {
    ensure_model();
    let classifier = setup_classifier(RuntimeConfig::default());
    let mut group = c.benchmark_group("InputLength");
    group.sample_size(20);

    for repeats in [1, 8, 64] {
        let text = SHORT_TEXT.repeat(repeats);
        group.bench_function(format!("repeats_{}", repeats), |b| b.iter(|| {
            classifier.predict(black_box(&text)).unwrap()
        }));
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tokenization,
    bench_prediction,
    bench_input_length
);
criterion_main!(benches);
