use std::{pin::Pin, sync::Arc, time::SystemTime};

use futures::{Stream, StreamExt};

#[derive(Debug, Clone)]
pub struct Envelope<T> {
    pub payload: T,
    pub received_at: SystemTime,
}

impl<T> Envelope<T> {
    pub fn now(payload: T) -> Self {
        Self {
            payload,
            received_at: SystemTime::now(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("source error: {0}")]
    Source(String),
    #[error("transform error: {0}")]
    Transform(String),
    #[error("sink error: {0}")]
    Sink(String),
}

pub type EnvelopeStream<T> = Pin<Box<dyn Stream<Item = Result<Envelope<T>, PipelineError>> + Send>>;

#[async_trait::async_trait]
pub trait Source<T>: Send + Sync {
    async fn stream(&self) -> EnvelopeStream<T>;
}

#[async_trait::async_trait]
pub trait Transform<I, O>: Send + Sync {
    async fn apply(&self, input: Envelope<I>) -> Result<Envelope<O>, PipelineError>;
}

#[async_trait::async_trait]
pub trait Sink<T>: Send + Sync {
    type Output: Send;

    async fn run<S>(&self, input: S) -> Result<Self::Output, PipelineError>
    where
        S: Stream<Item = Result<Envelope<T>, PipelineError>> + Send + Unpin + 'static;
}

pub struct Pipeline<S, T, K> {
    pub source: S,
    pub transforms: Vec<Arc<dyn Transform<T, T> + Send + Sync>>, // same-type transforms chain
    pub sink: K,
}

impl<T, S, K> Pipeline<S, T, K>
where
    T: Send + 'static,
    S: Source<T> + Send + Sync + 'static,
    K: Sink<T> + Send + Sync + 'static,
{
    pub async fn run(self) -> Result<K::Output, PipelineError> {
        let mut stream = self.source.stream().await;

        // Errors from upstream stages pass through untouched; the sink decides
        // whether they are fatal.
        for t in self.transforms {
            stream = Box::pin(stream.then(move |item| {
                let t = t.clone();
                async move {
                    match item {
                        Ok(env) => t.apply(env).await,
                        Err(e) => Err(e),
                    }
                }
            }));
        }

        self.sink.run(stream).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    struct Numbers(Vec<i64>);

    #[async_trait::async_trait]
    impl Source<i64> for Numbers {
        async fn stream(&self) -> EnvelopeStream<i64> {
            let items: Vec<_> = self.0.iter().copied().map(|n| Ok(Envelope::now(n))).collect();
            Box::pin(stream::iter(items))
        }
    }

    struct RejectNegative;

    #[async_trait::async_trait]
    impl Transform<i64, i64> for RejectNegative {
        async fn apply(&self, input: Envelope<i64>) -> Result<Envelope<i64>, PipelineError> {
            if input.payload < 0 {
                return Err(PipelineError::Transform("negative".to_string()));
            }
            Ok(input)
        }
    }

    struct Double;

    #[async_trait::async_trait]
    impl Transform<i64, i64> for Double {
        async fn apply(&self, mut input: Envelope<i64>) -> Result<Envelope<i64>, PipelineError> {
            input.payload *= 2;
            Ok(input)
        }
    }

    struct Collect;

    #[async_trait::async_trait]
    impl Sink<i64> for Collect {
        type Output = (Vec<i64>, usize);

        async fn run<S>(&self, mut input: S) -> Result<Self::Output, PipelineError>
        where
            S: Stream<Item = Result<Envelope<i64>, PipelineError>> + Send + Unpin + 'static,
        {
            let mut ok = Vec::new();
            let mut rejected = 0;
            while let Some(item) = input.next().await {
                match item {
                    Ok(env) => ok.push(env.payload),
                    Err(_) => rejected += 1,
                }
            }
            Ok((ok, rejected))
        }
    }

    #[tokio::test]
    async fn transforms_apply_in_order_and_errors_reach_the_sink() {
        let pipeline: Pipeline<_, i64, _> = Pipeline {
            source: Numbers(vec![1, -2, 3]),
            transforms: vec![Arc::new(RejectNegative), Arc::new(Double)],
            sink: Collect,
        };

        let (ok, rejected) = pipeline.run().await.unwrap();
        assert_eq!(ok, vec![2, 6]);
        assert_eq!(rejected, 1);
    }
}
