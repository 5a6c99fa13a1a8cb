use ndarray::{Array1, Array2, ArrayBase, Data, Ix2};
use rand::Rng;
use rand_xoshiro::Xoshiro256Plus;

use crate::k_means::algorithm::KMeans;
use crate::k_means::errors::KMeansError;
use crate::k_means::hyperparams::KMeansParams;
use crate::traits::Fit;
use crate::Float;

/// A clustering engine bound to a fixed number of clusters, which keeps the results of its
/// most recent fit around for later queries.
///
/// Every call to [`fit`](KMeansEngine::fit) starts from scratch: centroids are re-initialized
/// and the previous results are dropped, even if the new fit fails. Querying the engine before
/// a successful fit returns [`KMeansError::NotFitted`].
///
/// ```
/// use lloyd::{KMeansEngine, KMeansError};
/// use ndarray::array;
///
/// let mut engine = KMeansEngine::new(2);
/// assert!(matches!(engine.get_labels(), Err(KMeansError::NotFitted)));
///
/// let data = array![[0.], [1.], [10.], [11.]];
/// engine.fit(&data).expect("KMeans fitted");
///
/// let labels = engine.get_labels().unwrap();
/// assert_eq!(labels[0], labels[1]);
/// assert_eq!(labels[2], labels[3]);
/// assert_ne!(labels[0], labels[2]);
/// ```
#[derive(Clone, Debug)]
pub struct KMeansEngine<F: Float, R: Rng + Clone = Xoshiro256Plus> {
    params: KMeansParams<F, R>,
    // Only set after `fit` has succeeded
    fitted: Option<KMeans<F>>,
}

impl<F: Float> KMeansEngine<F, Xoshiro256Plus> {
    /// Engine looking for `n_clusters` clusters, with the default hyperparameters of
    /// [`KMeans::params`].
    pub fn new(n_clusters: usize) -> Self {
        Self::with_params(KMeans::params(n_clusters))
    }
}

impl<F: Float, R: Rng + Clone> KMeansEngine<F, R> {
    pub fn with_params(params: KMeansParams<F, R>) -> Self {
        KMeansEngine {
            params,
            fitted: None,
        }
    }

    /// The number of clusters every fit looks for
    pub fn n_clusters(&self) -> usize {
        self.params.0.n_clusters()
    }

    /// Runs Lloyd's algorithm on `observations`, with shape `(n_observations, n_features)`,
    /// and keeps the resulting model.
    pub fn fit<DA: Data<Elem = F>>(
        &mut self,
        observations: &ArrayBase<DA, Ix2>,
    ) -> Result<&KMeans<F>, KMeansError> {
        self.fitted = None;
        let model: Result<_, KMeansError> = self.params.fit(observations);
        Ok(self.fitted.insert(model?))
    }

    /// The model of the most recent successful fit
    pub fn model(&self) -> Result<&KMeans<F>, KMeansError> {
        self.fitted.as_ref().ok_or(KMeansError::NotFitted)
    }

    /// Consumes the engine and returns the model of the most recent successful fit
    pub fn into_model(self) -> Result<KMeans<F>, KMeansError> {
        self.fitted.ok_or(KMeansError::NotFitted)
    }

    /// Cluster index of every observation of the most recent fit
    pub fn get_labels(&self) -> Result<&Array1<usize>, KMeansError> {
        self.model().map(KMeans::labels)
    }

    pub fn centroids(&self) -> Result<&Array2<F>, KMeansError> {
        self.model().map(KMeans::centroids)
    }

    pub fn residual(&self) -> Result<F, KMeansError> {
        self.model().map(KMeans::residual)
    }

    pub fn inertia(&self) -> Result<F, KMeansError> {
        self.model().map(KMeans::inertia)
    }

    pub fn n_iterations(&self) -> Result<u64, KMeansError> {
        self.model().map(KMeans::n_iterations)
    }
}
