use lloyd::traits::Fit;
use lloyd::{EmptyClusterPolicy, KMeans};
use lloyd_datasets::generate;
use ndarray_npy::write_npy;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;

// Fit three clusters to positively correlated, non separable data and save points,
// memberships and centroids to disk for plotting.
fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Our random number generator, seeded for reproducibility
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    let observations = generate::correlated_line(50, 3., &mut rng);

    let model = KMeans::params_with_rng(3, rng)
        .empty_cluster(EmptyClusterPolicy::Reseed)
        .fit(&observations)
        .expect("KMeans fitted");

    println!("KMeans iterations: {}", model.n_iterations());
    println!("residual: {:.3}", model.residual());
    println!("inertia: {:.3}", model.inertia());
    for (cluster, (centroid, size)) in model
        .centroids()
        .rows()
        .into_iter()
        .zip(model.cluster_sizes())
        .enumerate()
    {
        println!("cluster {}: {} points around {}", cluster, size, centroid);
    }

    // We use the `npy` format for compatibility with NumPy and matplotlib
    write_npy("clustered_dataset.npy", &observations).expect("Failed to write .npy file");
    write_npy(
        "clustered_memberships.npy",
        &model.labels().map(|&x| x as u64),
    )
    .expect("Failed to write .npy file");
    write_npy("clustered_centroids.npy", model.centroids()).expect("Failed to write .npy file");
}
