use hyperloglog::HyperLogLog;

fn main() {
    let mut estimator1 = HyperLogLog::new();
    for i in 0..10 {
        estimator1.insert(&i);
    }
    println!("estimator1 count = {}", estimator1.count());

    let mut estimator2 = HyperLogLog::new();
    for i in 10..15 {
        estimator2.insert(&i);
    }
    println!("estimator2 count = {}", estimator2.count());

    estimator1.merge(&estimator2).expect("parameters match");
    println!("merged count = {}", estimator1.count());
}
